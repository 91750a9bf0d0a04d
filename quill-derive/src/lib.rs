//! Derive macros for quill property-based testing.
//!
//! This crate provides procedural macros to automatically derive
//! generators for custom types.

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, GenericArgument, PathArguments, Type};

/// Derive macro for automatically generating `Gen<T>` implementations.
///
/// The derived `generate()` draws every field, in declaration order, from a
/// generator chosen by its type. Enums pick a variant with `Gen::one_of`,
/// preferring earlier variants. Field types must implement `Debug`.
///
/// | field type        | generator                         |
/// |-------------------|-----------------------------------|
/// | `bool`            | `Gen::bool()`                     |
/// | integers, floats  | `Gen::<T>::any()`                 |
/// | `char`            | `Gen::<char>::any()`              |
/// | `String`          | `Gen::<String>::ascii()`          |
/// | `Vec<T>`          | `Gen::vec_of(..)`                 |
/// | `Option<T>`       | `Gen::option_of(.., true)`        |
/// | anything else     | `T::generate()`                   |
///
/// # Example
///
/// ```rust,ignore
/// use quill::*;
///
/// #[derive(Generate, Debug, Clone, PartialEq)]
/// struct User {
///     name: String,
///     age: u32,
///     email: Option<String>,
/// }
///
/// let user_gen = User::generate();
/// ```
#[proc_macro_derive(Generate)]
pub fn derive_generate(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match generate_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn generate_impl(input: &DeriveInput) -> Result<TokenStream2, syn::Error> {
    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let generator_impl = match &input.data {
        Data::Struct(data) => generate_fields(&data.fields, quote! { Self })?,
        Data::Enum(data) => generate_enum_impl(input, data)?,
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "Generate derive macro does not support unions",
            ));
        }
    };

    let expanded = quote! {
        impl #impl_generics #name #ty_generics #where_clause {
            /// Generate a generator for this type.
            pub fn generate() -> quill::Gen<Self> {
                #generator_impl
            }
        }
    };

    Ok(expanded)
}

/// A generator building `constructor` from `fields`.
///
/// Field generators are built once, outside the draw closure.
fn generate_fields(fields: &Fields, constructor: TokenStream2) -> Result<TokenStream2, syn::Error> {
    let gens = fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let var = syn::Ident::new(&format!("field_{i}"), Span::call_site());
            let generator = generate_field_generator(&field.ty)?;
            Ok((var, generator))
        })
        .collect::<Result<Vec<_>, syn::Error>>()?;

    let bindings = gens.iter().map(|(var, gen)| {
        quote! { let #var = #gen; }
    });

    let value = match fields {
        Fields::Named(named) => {
            let assignments = named.named.iter().zip(&gens).map(|(field, (var, _))| {
                let ident = &field.ident;
                let label = ident.as_ref().map(|ident| ident.to_string()).unwrap_or_default();
                quote! { #ident: case.draw(&#var, #label)? }
            });
            quote! { #constructor { #(#assignments),* } }
        }
        Fields::Unnamed(_) => {
            let draws = gens.iter().enumerate().map(|(i, (var, _))| {
                let label = i.to_string();
                quote! { case.draw(&#var, #label)? }
            });
            quote! { #constructor(#(#draws),*) }
        }
        Fields::Unit => constructor,
    };

    let case = if fields.is_empty() {
        quote! { _case }
    } else {
        quote! { case }
    };

    Ok(quote! {
        {
            #(#bindings)*
            quill::Gen::custom(move |#case| Ok(#value))
        }
    })
}

fn generate_enum_impl(input: &DeriveInput, data: &syn::DataEnum) -> Result<TokenStream2, syn::Error> {
    if data.variants.is_empty() {
        return Err(syn::Error::new_spanned(
            input,
            "Generate derive macro needs at least one variant",
        ));
    }

    let variants = data
        .variants
        .iter()
        .map(|variant| {
            let variant_name = &variant.ident;
            generate_fields(&variant.fields, quote! { Self::#variant_name })
        })
        .collect::<Result<Vec<_>, syn::Error>>()?;

    Ok(quote! {
        quill::Gen::one_of(vec![
            #(#variants),*
        ])
    })
}

/// The single type argument of `Vec<T>` / `Option<T>` style paths.
fn type_argument(arguments: &PathArguments) -> Option<&Type> {
    let PathArguments::AngleBracketed(args) = arguments else {
        return None;
    };
    match args.args.first() {
        Some(GenericArgument::Type(ty)) if args.args.len() == 1 => Some(ty),
        _ => None,
    }
}

/// Generate a field generator based on the type.
fn generate_field_generator(field_type: &Type) -> Result<TokenStream2, syn::Error> {
    let Type::Path(type_path) = field_type else {
        return Ok(quote! { <#field_type>::generate() });
    };
    let Some(segment) = type_path.path.segments.last() else {
        return Err(syn::Error::new_spanned(
            field_type,
            "Unable to generate generator for this type",
        ));
    };

    let generator = match segment.ident.to_string().as_str() {
        "bool" => quote! { quill::Gen::bool() },
        "i8" | "i16" | "i32" | "i64" | "isize" | "u8" | "u16" | "u32" | "u64" | "usize"
        | "f32" | "f64" | "char" => quote! { quill::Gen::<#field_type>::any() },
        "String" => quote! { quill::Gen::<String>::ascii() },
        "Vec" | "Option" => {
            let Some(inner) = type_argument(&segment.arguments) else {
                return Err(syn::Error::new_spanned(
                    field_type,
                    "expected exactly one type argument",
                ));
            };
            let inner = generate_field_generator(inner)?;
            if segment.ident == "Vec" {
                quote! { quill::Gen::vec_of(#inner) }
            } else {
                quote! { quill::Gen::option_of(#inner, true) }
            }
        }
        _ => quote! { <#field_type>::generate() },
    };
    Ok(generator)
}
