//! 注入能力派生宏实现

use crate::utils::{extract_generic_type, has_marker, is_arc_type, is_option_type, parse_lit_str};
use proc_macro::TokenStream;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::{Data, DeriveInput, Field, Fields, Result, Token, Type};

/// 默认注入点名称
const DEFAULT_POINT_NAME: &str = "fields";

/// `#[injectable(...)]` 参数
#[derive(Debug, Clone, Default)]
pub struct InjectableArgs {
    /// 注入点名称
    pub name: Option<String>,
}

impl InjectableArgs {
    /// 从结构体属性中解析参数
    pub fn from_attributes(attrs: &[syn::Attribute]) -> Result<Self> {
        let mut args = Self::default();
        for attr in attrs.iter().filter(|attr| attr.path().is_ident("injectable")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    args.name = Some(parse_lit_str(&meta.value()?.parse()?)?);
                    Ok(())
                } else {
                    Err(meta.error("未知的 injectable 参数"))
                }
            })?;
        }
        Ok(args)
    }
}

/// 注入字段
struct InjectedField<'a> {
    field: &'a Field,
    dependency: &'a Type,
    optional: bool,
}

impl<'a> InjectedField<'a> {
    fn parse(field: &'a Field) -> Result<Self> {
        let (inner, optional) = if is_option_type(&field.ty) {
            (extract_generic_type(&field.ty), true)
        } else {
            (Some(&field.ty), false)
        };

        let dependency = inner
            .filter(|ty| is_arc_type(ty))
            .and_then(extract_generic_type)
            .ok_or_else(|| {
                syn::Error::new_spanned(&field.ty, "注入字段的类型必须是 Arc<T> 或 Option<Arc<T>>")
            })?;

        Ok(Self {
            field,
            dependency,
            optional,
        })
    }
}

/// 实现 #[derive(Injectable)] 宏
pub fn derive_injectable_impl(input: DeriveInput) -> TokenStream {
    match expand(&input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(e) => e.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> Result<proc_macro2::TokenStream> {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let args = InjectableArgs::from_attributes(&input.attrs)?;
    let point_name = args.name.as_deref().unwrap_or(DEFAULT_POINT_NAME);

    let empty = Punctuated::<Field, Token![,]>::new();
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            Fields::Unit => &empty,
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    struct_name,
                    "Injectable 不支持元组结构体",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                struct_name,
                "Injectable 只能派生于结构体",
            ))
        }
    };

    let injected = fields
        .iter()
        .filter(|field| has_marker(&field.attrs, "inject"))
        .map(InjectedField::parse)
        .collect::<Result<Vec<_>>>()?;

    let parameters = injected.iter().map(|injected| {
        let dependency = injected.dependency;
        quote! { .with_parameter::<#dependency>() }
    });

    let assignments = injected.iter().map(|injected| {
        let ident = &injected.field.ident;
        let dependency = injected.dependency;
        if injected.optional {
            quote! {
                self.#ident = ::core::option::Option::Some(dependencies.take::<#dependency>()?);
            }
        } else {
            quote! {
                self.#ident = dependencies.take::<#dependency>()?;
            }
        }
    });

    Ok(quote! {
        impl #impl_generics ::infrastructure_common::Injectable for #struct_name #ty_generics #where_clause {
            fn injection_points(&self) -> ::std::vec::Vec<::infrastructure_common::InjectionPoint> {
                ::std::vec![
                    ::infrastructure_common::InjectionPoint::new(#point_name) #(#parameters)*
                ]
            }

            #[allow(unused_mut)]
            fn inject(
                &mut self,
                _point: &::infrastructure_common::InjectionPoint,
                mut dependencies: ::infrastructure_common::Dependencies,
            ) -> ::infrastructure_common::DependencyResult<()> {
                #(#assignments)*
                ::core::result::Result::Ok(())
            }
        }
    })
}
