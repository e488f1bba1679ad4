use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, parse_macro_input};

/// Derive macro for `FromRow` trait.
///
/// Fields are bound to result columns in declaration order; column names are not consulted.
/// Every field type must implement `FromColumn`.
///
/// # Example
///
/// ```ignore
/// #[derive(FromRow)]
/// struct User {
///     id: i32,
///     email: String,
///     age: Option<u8>,
/// }
///
/// let mut users: Vec<User> = Vec::new();
/// conn.run_query(&mut users, "SELECT id, email, age FROM user", &())?;
/// ```
///
/// Tuple structs are supported as well.
#[proc_macro_derive(FromRow)]
pub fn derive_from_row(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        _ => {
            return syn::Error::new(input.ident.span(), "FromRow only supports structs")
                .to_compile_error()
                .into();
        }
    };

    if fields.is_empty() {
        return syn::Error::new(
            input.ident.span(),
            "FromRow requires at least one field",
        )
        .to_compile_error()
        .into();
    }

    let field_types: Vec<_> = fields.iter().map(|f| &f.ty).collect();
    let arity = field_types.len();

    let output_binds = field_types.iter().map(|ty| {
        quote! { <#ty as ::typed_mysql::FromColumn>::output_bind() }
    });

    let decoded = field_types.iter().enumerate().map(|(i, ty)| {
        quote! { <#ty as ::typed_mysql::FromColumn>::from_bind(#i, &__binds[#i])? }
    });

    let construct = match fields {
        Fields::Named(named) => {
            let names = named.named.iter().map(|f| &f.ident);
            quote! { Self { #(#names: #decoded),* } }
        }
        Fields::Unnamed(_) => quote! { Self ( #(#decoded),* ) },
        Fields::Unit => quote! { Self },
    };

    let expanded = quote! {
        impl #impl_generics ::typed_mysql::FromRow for #name #ty_generics #where_clause {
            const ARITY: usize = #arity;

            fn output_binds() -> ::std::vec::Vec<::typed_mysql::bind::OutputBind> {
                ::std::vec![#(#output_binds),*]
            }

            fn from_binds(
                __binds: &[::typed_mysql::bind::OutputBind],
            ) -> ::typed_mysql::error::Result<Self> {
                ::typed_mysql::protocol::r#trait::row::check_arity(__binds, #arity)?;
                Ok(#construct)
            }
        }
    };

    TokenStream::from(expanded)
}
