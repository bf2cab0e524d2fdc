use proc_macro::TokenStream;

mod configuration;

/// Derive macro for binding a struct from property sources
///
/// Generates `Introspect` and `Bindable` so the type can be registered as a
/// configuration bean or nested inside another configuration type.
///
/// Type attributes:
/// - `#[config(prefix = "...")]` marks the type as configuration properties
/// - `#[config(constructor_binding)]` binds every field through a generated
///   constructor; without it the type is built with `Default` and its fields
///   are set afterwards
///
/// Field attributes:
/// - `#[config(rename = "...")]` binds the field under another name
/// - `#[config(default)]` / `#[config(default = "...")]` default for a
///   constructor-bound field with no source value
///
/// # Example
/// ```ignore
/// use ignition::ConfigurationProperties;
///
/// #[derive(ConfigurationProperties)]
/// #[config(prefix = "mail", constructor_binding)]
/// pub struct MailProperties {
///     host: String,
///     #[config(default = "25")]
///     port: u16,
///     #[config(default)]
///     recipients: Vec<String>,
/// }
/// ```
#[proc_macro_derive(ConfigurationProperties, attributes(config))]
pub fn derive_configuration_properties(input: TokenStream) -> TokenStream {
    configuration::derive_configuration_properties(input)
}
