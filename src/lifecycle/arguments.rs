use std::collections::BTreeMap;

/// Raw command-line arguments split into options and non-option values.
///
/// `--name=value` and bare `--name` are options; everything else is a
/// non-option argument. A lone `--` is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationArguments {
    source_args: Vec<String>,
    options: BTreeMap<String, Vec<String>>,
    non_option_args: Vec<String>,
}

impl ApplicationArguments {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let source_args: Vec<String> = args.into_iter().map(Into::into).collect();
        let mut options: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut non_option_args = Vec::new();

        for arg in &source_args {
            match arg.strip_prefix("--") {
                Some("") => {}
                Some(option) => {
                    let (name, value) = match option.split_once('=') {
                        Some((name, value)) => (name, Some(value.to_string())),
                        None => (option, None),
                    };
                    let values = options.entry(name.to_string()).or_default();
                    values.extend(value);
                }
                None => non_option_args.push(arg.clone()),
            }
        }

        Self {
            source_args,
            options,
            non_option_args,
        }
    }

    pub fn source_args(&self) -> &[String] {
        &self.source_args
    }

    pub fn option_names(&self) -> impl Iterator<Item = &str> {
        self.options.keys().map(String::as_str)
    }

    pub fn contains_option(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }

    /// Values given for `name`; empty for a bare flag, `None` if never given.
    pub fn option_values(&self, name: &str) -> Option<&[String]> {
        self.options.get(name).map(Vec::as_slice)
    }

    pub fn non_option_args(&self) -> &[String] {
        &self.non_option_args
    }
}
