use darling::ast::Data;
use darling::util::{Ignored, Override};
use darling::{FromDeriveInput, FromField};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{parse_macro_input, DeriveInput};

#[derive(FromDeriveInput)]
#[darling(attributes(config), supports(struct_named))]
struct ConfigurationOpts {
    ident: syn::Ident,
    generics: syn::Generics,
    data: Data<Ignored, FieldOpts>,
    /// Prefix the type binds under; marks the type as configuration properties
    #[darling(default)]
    prefix: Option<String>,
    /// Bind through a field-wise constructor instead of setters
    #[darling(default)]
    constructor_binding: bool,
}

#[derive(FromField)]
#[darling(attributes(config))]
struct FieldOpts {
    ident: Option<syn::Ident>,
    ty: syn::Type,
    #[darling(default)]
    rename: Option<String>,
    /// `default` alone marks an empty default, `default = "..."` a literal one
    #[darling(default, rename = "default")]
    default_value: Option<Override<String>>,
}

struct Member<'a> {
    ident: &'a syn::Ident,
    ty: &'a syn::Type,
    name: String,
    default_value: Option<&'a Override<String>>,
}

pub fn derive_configuration_properties(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let expanded = match ConfigurationOpts::from_derive_input(&input) {
        Ok(opts) => generate_configuration_impl(&opts).unwrap_or_else(darling::Error::write_errors),
        Err(err) => err.write_errors(),
    };
    TokenStream::from(expanded)
}

fn generate_configuration_impl(opts: &ConfigurationOpts) -> darling::Result<TokenStream2> {
    let struct_name = &opts.ident;
    if !opts.generics.params.is_empty() {
        return Err(darling::Error::custom(
            "#[derive(ConfigurationProperties)] does not support generic structs",
        )
        .with_span(&opts.generics));
    }

    let members = collect_members(opts)?;

    let prefix_call = opts.prefix.as_ref().map(|prefix| quote!(.with_prefix(#prefix)));
    let binding_call = opts
        .constructor_binding
        .then(|| quote!(.constructor_binding()));

    let constructor = if opts.constructor_binding {
        let parameters = members.iter().map(|member| {
            let ty = member.ty;
            let name = &member.name;
            let default_call = member.default_value.map(|default_value| match default_value {
                Override::Inherit => {
                    quote!(.with_default(::ignition::properties::DefaultValue::Empty))
                }
                Override::Explicit(literal) => quote!(
                    .with_default(::ignition::properties::DefaultValue::Literal(
                        ::std::string::String::from(#literal)
                    ))
                ),
            });
            quote! {
                ::ignition::properties::ParameterDescriptor::of::<#ty>(#name) #default_call
            }
        });
        let assignments = members.iter().map(|member| {
            let ident = member.ident;
            quote!(#ident: args.take()?)
        });
        quote! {
            ::ignition::properties::ConstructorDescriptor::new(
                ::std::vec![#(#parameters),*],
                |args| {
                    ::std::result::Result::Ok(::std::boxed::Box::new(Self {
                        #(#assignments),*
                    }) as ::ignition::properties::AnyValue)
                },
            )
        }
    } else {
        quote!(::ignition::properties::ConstructorDescriptor::default_of::<Self>())
    };

    let properties = members.iter().map(|member| {
        let ident = member.ident;
        let ty = member.ty;
        let name = &member.name;
        quote! {
            .with_property(::ignition::properties::PropertyDescriptor::field::<Self, #ty>(
                #name,
                |target| &mut target.#ident,
            ))
        }
    });

    Ok(quote! {
        impl ::ignition::properties::Introspect for #struct_name {
            fn type_descriptor() -> ::ignition::properties::TypeDescriptor {
                ::ignition::properties::TypeDescriptor::of::<Self>()
                    #prefix_call
                    #binding_call
                    .with_constructor(#constructor)
                    #(#properties)*
            }
        }

        impl ::ignition::properties::Bindable for #struct_name {
            fn value_kind() -> ::ignition::properties::ValueKind {
                ::ignition::properties::ValueKind::Nested(
                    <Self as ::ignition::properties::Introspect>::type_descriptor,
                )
            }

            fn from_bound(
                value: ::ignition::properties::BoundValue,
            ) -> ::std::result::Result<Self, ::ignition::properties::ConversionError> {
                value.into_object::<Self>()
            }

            fn nested_mut(&mut self) -> ::std::option::Option<&mut dyn ::std::any::Any> {
                ::std::option::Option::Some(self as &mut dyn ::std::any::Any)
            }
        }
    })
}

fn collect_members(opts: &ConfigurationOpts) -> darling::Result<Vec<Member<'_>>> {
    let fields = match &opts.data {
        Data::Struct(fields) => fields,
        Data::Enum(_) => {
            return Err(darling::Error::custom(
                "#[derive(ConfigurationProperties)] can only be applied to structs",
            ))
        }
    };

    let mut errors = darling::Error::accumulator();
    let mut members = Vec::new();
    for field in fields.iter() {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        if field.default_value.is_some() && !opts.constructor_binding {
            errors.push(
                darling::Error::custom(
                    "`default` applies to constructor-bound types; use `Default` for property binding",
                )
                .with_span(ident),
            );
            continue;
        }
        members.push(Member {
            ident,
            ty: &field.ty,
            name: field
                .rename
                .clone()
                .unwrap_or_else(|| ident.unraw().to_string()),
            default_value: field.default_value.as_ref(),
        });
    }
    errors.finish_with(members)
}
