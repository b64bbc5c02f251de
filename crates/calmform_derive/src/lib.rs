use proc_macro::TokenStream;
use proc_macro2::{Ident, Span, TokenStream as TokenStream2};
use proc_macro_crate::{FoundCrate, crate_name};
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Fields, parse_macro_input};

#[proc_macro_derive(FormValues)]
pub fn derive_form_values(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(
            input.ident,
            "FormValues derive currently supports only non-generic structs",
        )
        .to_compile_error()
        .into();
    }

    let model_ident = input.ident;
    let fields_struct_ident = format_ident!("{model_ident}Fields");

    let named_fields = match input.data {
        Data::Struct(data) => match data.fields {
            Fields::Named(fields) => fields.named,
            _ => {
                return syn::Error::new(
                    Span::call_site(),
                    "FormValues derive requires a struct with named fields",
                )
                .to_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new(
                Span::call_site(),
                "FormValues derive is only supported on structs",
            )
            .to_compile_error()
            .into();
        }
    };

    let form = calmform_form_path();
    let mut key_methods = Vec::new();
    let mut field_names = Vec::new();
    let mut inserts = Vec::new();
    let mut reads = Vec::new();

    for field in named_fields {
        let Some(field_ident) = field.ident else {
            continue;
        };
        let field_name = field_ident.to_string();

        key_methods.push(quote! {
            pub fn #field_ident(&self) -> #form::FieldKey {
                #form::FieldKey::new(#field_name)
            }
        });
        inserts.push(quote! {
            values.insert(
                #form::FieldKey::new(#field_name),
                #form::Value::from(::core::clone::Clone::clone(&self.#field_ident)),
            );
        });
        reads.push(quote! {
            #field_ident: #form::field_from_values(values, #field_name)?,
        });
        field_names.push(field_name);
    }

    quote! {
        #[derive(Clone, Copy, Debug, Default)]
        pub struct #fields_struct_ident;

        impl #fields_struct_ident {
            #(#key_methods)*
        }

        impl #form::FormValues for #model_ident {
            type Fields = #fields_struct_ident;

            fn fields() -> Self::Fields {
                #fields_struct_ident
            }

            fn field_keys() -> &'static [&'static str] {
                &[#(#field_names),*]
            }

            fn to_values(&self) -> #form::Values {
                let mut values = #form::Values::new();
                #(#inserts)*
                values
            }

            fn from_values(values: &#form::Values) -> #form::FormResult<Self> {
                Ok(Self {
                    #(#reads)*
                })
            }
        }
    }
    .into()
}

fn calmform_form_path() -> TokenStream2 {
    match crate_name("calmform") {
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(::#ident::form)
        }
        Ok(FoundCrate::Itself) => quote!(crate::form),
        Err(_) => quote!(::calmform::form),
    }
}
