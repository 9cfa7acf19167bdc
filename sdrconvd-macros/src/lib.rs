use darling::Error;
use darling::ast::NestedMeta;
use quote::quote;
use syn::{Data, DeriveInput, Fields, ItemStruct, parse_macro_input};

use proc_macro::TokenStream;

/// Serializes every field in declaration order as little-endian bytes.
#[proc_macro_derive(ToBytes)]
pub fn derive_to_bytes(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = input.ident;

    let fields: Vec<syn::Member> = match input.data {
        Data::Struct(ref s) => match s.fields {
            Fields::Named(ref nf) => nf
                .named
                .iter()
                .filter_map(|f| f.ident.clone())
                .map(syn::Member::from)
                .collect(),
            Fields::Unnamed(ref uf) => (0..uf.unnamed.len())
                .map(|i| syn::Index::from(i).into())
                .collect(),
            Fields::Unit => Vec::new(),
        },
        Data::Enum(ref e) => {
            return syn::Error::new_spanned(e.enum_token, "ToBytes only supports structs")
                .to_compile_error()
                .into();
        }
        Data::Union(ref u) => {
            return syn::Error::new_spanned(u.union_token, "ToBytes only supports structs")
                .to_compile_error()
                .into();
        }
    };

    let expanded = quote! {
        impl crate::byteorder::WriteBytesLe for #name {
            fn write_le(&self, dst: &mut Vec<u8>) {
                #( crate::byteorder::WriteBytesLe::write_le(&self.#fields, dst); )*
            }
        }
    };

    TokenStream::from(expanded)
}

/// Implements `RiffChunk` for a struct, tagging it with a four byte chunk id.
///
/// ```ignore
/// #[riff_chunk_type(b"fmt ")]
/// #[derive(ToBytes)]
/// struct FormatChunk { /* ... */ }
/// ```
#[proc_macro_attribute]
pub fn riff_chunk_type(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = match NestedMeta::parse_meta_list(attr.into()) {
        Ok(v) => v,
        Err(e) => {
            return TokenStream::from(Error::from(e).write_errors());
        }
    };

    let Some(first) = args.first() else {
        return TokenStream::from(Error::custom("riff_chunk_type expects a chunk id").write_errors());
    };

    let chunk_id = match first {
        NestedMeta::Lit(syn::Lit::ByteStr(bs)) => bs.value(),
        other => {
            return TokenStream::from(
                syn::Error::new_spanned(other, "expected a byte string, e.g. b\"fmt \"")
                    .to_compile_error(),
            );
        }
    };

    if chunk_id.len() != 4 {
        return TokenStream::from(
            syn::Error::new_spanned(first, "chunk id must be exactly 4 bytes").to_compile_error(),
        );
    }

    let input = parse_macro_input!(item as ItemStruct);
    let name = &input.ident;

    let expanded = quote! {
        #input

        impl crate::wav::RiffChunk for #name {
            fn chunk_id(&self) -> &[u8; 4] {
                const ID: [u8; 4] = [#(#chunk_id),*];
                &ID
            }

            fn chunk_data(&self) -> Vec<u8> {
                let mut data = Vec::new();
                crate::byteorder::WriteBytesLe::write_le(self, &mut data);
                data
            }
        }
    };
    TokenStream::from(expanded)
}
