use proc_macro::TokenStream;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Field, Fields, Type, parse_macro_input};

/// Derive `Component` and `Reflect` for a struct, providing runtime reflection.
///
/// Every field is reflected by name (tuple fields by index) unless its name
/// starts with `_` or it carries `#[reflect(skip)]`.
///
/// # Named structs
///
/// ```ignore
/// #[derive(Default, Component)]
/// struct Light {
///     color: Vec3,
///     intensity: f32,
///     #[reflect(skip)]
///     shadow_map: Option<ShadowHandle>,
/// }
/// ```
///
/// # Tuple structs
///
/// ```ignore
/// #[derive(Default, Component)]
/// struct Name(pub String);
/// ```
#[proc_macro_derive(Component, attributes(reflect))]
pub fn derive_component(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let name_str = name.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        _ => {
            return syn::Error::new_spanned(
                &input.ident,
                "Component can only be derived for structs",
            )
            .to_compile_error()
            .into();
        }
    };

    // (field name as string, accessor tokens, type)
    let mut visible = Vec::new();
    match fields {
        Fields::Named(named) => {
            for f in &named.named {
                let Some(ident) = f.ident.as_ref() else {
                    continue;
                };
                match is_skipped(f) {
                    Ok(true) => continue,
                    Ok(false) => {}
                    Err(err) => return err.to_compile_error().into(),
                }
                if ident.to_string().starts_with('_') {
                    continue;
                }
                visible.push((ident.to_string(), quote! { #ident }, &f.ty));
            }
        }
        Fields::Unnamed(unnamed) => {
            for (i, f) in unnamed.unnamed.iter().enumerate() {
                match is_skipped(f) {
                    Ok(true) => continue,
                    Ok(false) => {}
                    Err(err) => return err.to_compile_error().into(),
                }
                let idx = syn::Index::from(i);
                visible.push((i.to_string(), quote! { #idx }, &f.ty));
            }
        }
        Fields::Unit => {}
    }

    let infos = visible.iter().map(|(fname, _, ftype)| {
        let kind = infer_field_kind(ftype);
        quote! {
            ember_ecs::FieldInfo {
                name: #fname,
                type_name: ::core::any::type_name::<#ftype>(),
                kind: #kind,
            }
        }
    });

    let field_arms = visible.iter().map(|(fname, access, _)| {
        quote! {
            #fname => ::core::option::Option::Some(&self.#access as &dyn ::core::any::Any)
        }
    });

    let field_mut_arms = visible.iter().map(|(fname, access, _)| {
        quote! {
            #fname => ::core::option::Option::Some(&mut self.#access as &mut dyn ::core::any::Any)
        }
    });

    let expanded = quote! {
        impl #impl_generics ember_ecs::Reflect for #name #ty_generics #where_clause {
            fn component_name(&self) -> &'static str {
                #name_str
            }

            fn field_infos(&self) -> &'static [ember_ecs::FieldInfo] {
                static INFOS: ::std::sync::LazyLock<::std::vec::Vec<ember_ecs::FieldInfo>> =
                    ::std::sync::LazyLock::new(|| ::std::vec![#(#infos),*]);
                &INFOS
            }

            #[allow(unused_variables)]
            fn field(&self, name: &str) -> ::core::option::Option<&dyn ::core::any::Any> {
                match name {
                    #(#field_arms,)*
                    _ => ::core::option::Option::None,
                }
            }

            #[allow(unused_variables)]
            fn field_mut(&mut self, name: &str) -> ::core::option::Option<&mut dyn ::core::any::Any> {
                match name {
                    #(#field_mut_arms,)*
                    _ => ::core::option::Option::None,
                }
            }
        }

        impl #impl_generics ember_ecs::Component for #name #ty_generics #where_clause {
            const NAME: &'static str = #name_str;
        }
    };

    expanded.into()
}

/// Returns true for fields marked `#[reflect(skip)]`.
fn is_skipped(field: &Field) -> syn::Result<bool> {
    let mut skip = false;
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("reflect")) {
        parse_reflect_attr(attr, &mut skip)?;
    }
    Ok(skip)
}

fn parse_reflect_attr(attr: &Attribute, skip: &mut bool) -> syn::Result<()> {
    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("skip") {
            *skip = true;
            Ok(())
        } else {
            Err(meta.error("unsupported reflect option, expected `skip`"))
        }
    })
}

/// Infer `FieldKind` from a type by matching the last path segment.
/// Unrecognised types are reflected as `Opaque`.
fn infer_field_kind(ty: &Type) -> proc_macro2::TokenStream {
    let type_name = extract_last_segment(ty);
    match type_name.as_str() {
        "bool" => quote! { ember_ecs::FieldKind::Bool },
        "f32" => quote! { ember_ecs::FieldKind::F32 },
        "u8" => quote! { ember_ecs::FieldKind::U8 },
        "u32" => quote! { ember_ecs::FieldKind::U32 },
        "i32" => quote! { ember_ecs::FieldKind::I32 },
        "u64" => quote! { ember_ecs::FieldKind::U64 },
        "Vec2" => quote! { ember_ecs::FieldKind::Vec2 },
        "Vec3" => quote! { ember_ecs::FieldKind::Vec3 },
        "Vec4" => quote! { ember_ecs::FieldKind::Vec4 },
        "Quat" => quote! { ember_ecs::FieldKind::Quat },
        "Mat4" => quote! { ember_ecs::FieldKind::Mat4 },
        "String" => quote! { ember_ecs::FieldKind::String },
        "Entity" => quote! { ember_ecs::FieldKind::Entity },
        _ => quote! { ember_ecs::FieldKind::Opaque },
    }
}

/// Extract the last segment name from a type path (e.g. `math::Vec3` → `"Vec3"`).
fn extract_last_segment(ty: &Type) -> String {
    match ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .map(|segment| segment.ident.to_string())
            .unwrap_or_default(),
        _ => String::new(),
    }
}
