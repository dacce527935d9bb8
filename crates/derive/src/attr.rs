//! Attribute parsing for the `#[config(...)]` namespace.
//!
//! Container, field and variant attributes all live under `#[config(...)]`.
//! Unknown keys are rejected so typos surface at compile time.

use syn::{Attribute, Expr, ExprPath, Lit, LitStr, meta::ParseNestedMeta};

/// Naming policy selected with `#[config(naming = "...")]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Naming {
    Default,
    PascalCase,
    CamelCase,
    SnakeCase,
    KebabCase,
}

impl Naming {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "default" => Some(Naming::Default),
            "PascalCase" => Some(Naming::PascalCase),
            "camelCase" => Some(Naming::CamelCase),
            "snake_case" => Some(Naming::SnakeCase),
            "kebab-case" => Some(Naming::KebabCase),
            _ => None,
        }
    }

    /// The `NamingPolicy` variant this maps to.
    pub fn variant(self) -> &'static str {
        match self {
            Naming::Default => "Default",
            Naming::PascalCase => "PascalCase",
            Naming::CamelCase => "CamelCase",
            Naming::SnakeCase => "SnakeCase",
            Naming::KebabCase => "KebabCase",
        }
    }
}

/// Container-level attributes.
///
/// - `naming = "..."` - naming policy for fields without explicit names
/// - `post_construct = path` - hook run after denormalization (repeatable)
/// - `constructor = path` - creates the instance settings are read into
#[derive(Debug, Default)]
pub struct ContainerAttrs {
    pub naming: Option<Naming>,
    pub post_construct: Vec<ExprPath>,
    pub constructor: Option<ExprPath>,
}

impl ContainerAttrs {
    pub fn from_ast(attrs: &[Attribute]) -> syn::Result<Self> {
        parse_config_attrs(attrs, |result: &mut Self, meta| {
            if meta.path.is_ident("naming") {
                let lit: LitStr = meta.value()?.parse()?;
                result.naming = Some(
                    Naming::from_str(&lit.value())
                        .ok_or_else(|| syn::Error::new_spanned(&lit, format!("unknown naming policy: {}", lit.value())))?,
                );
            } else if meta.path.is_ident("post_construct") {
                result.post_construct.push(parse_path_value(meta)?);
            } else if meta.path.is_ident("constructor") {
                result.constructor = Some(parse_path_value(meta)?);
            } else {
                return Err(meta.error("unknown container attribute"));
            }
            Ok(())
        })
    }
}

/// Which keys of the dictionary a fallback field leaves to other fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distinct {
    Name,
    Property,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalizeStrategy {
    #[default]
    Replace,
    Before,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DenormalizeStrategy {
    #[default]
    Replace,
    After,
}

/// Field-level attributes.
///
/// - `name = "..."`, `alias = "..."`, `describe = "..."` (each repeatable)
/// - `validate = "..."`, `silent`
/// - `optional`, `transient`, `constant`, `exclude`
/// - `fallback` or `fallback(distinct = "name" | "property")`
/// - `normalize_with = path`, `normalize_strategy = "replace" | "before"`
/// - `denormalize_with = path`, `denormalize_strategy = "replace" | "after"`
/// - `dictionary_schema = path`
///
/// Doc comments become the description when no `describe` is given.
#[derive(Debug, Default)]
pub struct FieldAttrs {
    pub names: Vec<String>,
    pub aliases: Vec<String>,
    pub describe: Vec<String>,
    pub validate: Option<String>,
    pub silent: bool,
    pub optional: bool,
    pub transient: bool,
    pub constant: bool,
    pub exclude: bool,
    pub fallback: Option<Distinct>,
    pub normalize_with: Option<ExprPath>,
    pub normalize_strategy: NormalizeStrategy,
    pub denormalize_with: Option<ExprPath>,
    pub denormalize_strategy: DenormalizeStrategy,
    pub dictionary_schema: Option<ExprPath>,
}

impl FieldAttrs {
    pub fn from_ast(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut result: Self = parse_config_attrs(attrs, |result: &mut Self, meta| {
            let path = &meta.path;
            if path.is_ident("name") {
                result.names.push(parse_str_value(meta)?);
            } else if path.is_ident("alias") {
                result.aliases.push(parse_str_value(meta)?);
            } else if path.is_ident("describe") {
                result.describe.push(parse_str_value(meta)?);
            } else if path.is_ident("validate") {
                result.validate = Some(parse_str_value(meta)?);
            } else if path.is_ident("silent") {
                result.silent = true;
            } else if path.is_ident("optional") {
                result.optional = true;
            } else if path.is_ident("transient") {
                result.transient = true;
            } else if path.is_ident("constant") {
                result.constant = true;
            } else if path.is_ident("exclude") {
                result.exclude = true;
            } else if path.is_ident("fallback") {
                let mut distinct = Distinct::Name;
                if meta.input.peek(syn::token::Paren) {
                    meta.parse_nested_meta(|inner| {
                        if !inner.path.is_ident("distinct") {
                            return Err(inner.error("expected `distinct`"));
                        }
                        let lit: LitStr = inner.value()?.parse()?;
                        distinct = match lit.value().as_str() {
                            "name" => Distinct::Name,
                            "property" => Distinct::Property,
                            other => {
                                return Err(syn::Error::new_spanned(
                                    &lit,
                                    format!("unknown distinct policy: {other}"),
                                ));
                            }
                        };
                        Ok(())
                    })?;
                }
                result.fallback = Some(distinct);
            } else if path.is_ident("normalize_with") {
                result.normalize_with = Some(parse_path_value(meta)?);
            } else if path.is_ident("normalize_strategy") {
                let lit: LitStr = meta.value()?.parse()?;
                result.normalize_strategy = match lit.value().as_str() {
                    "replace" => NormalizeStrategy::Replace,
                    "before" => NormalizeStrategy::Before,
                    other => {
                        return Err(syn::Error::new_spanned(&lit, format!("unknown normalize strategy: {other}")));
                    }
                };
            } else if path.is_ident("denormalize_with") {
                result.denormalize_with = Some(parse_path_value(meta)?);
            } else if path.is_ident("denormalize_strategy") {
                let lit: LitStr = meta.value()?.parse()?;
                result.denormalize_strategy = match lit.value().as_str() {
                    "replace" => DenormalizeStrategy::Replace,
                    "after" => DenormalizeStrategy::After,
                    other => {
                        return Err(syn::Error::new_spanned(
                            &lit,
                            format!("unknown denormalize strategy: {other}"),
                        ));
                    }
                };
            } else if path.is_ident("dictionary_schema") {
                result.dictionary_schema = Some(parse_path_value(meta)?);
            } else {
                return Err(meta.error("unknown field attribute"));
            }
            Ok(())
        })?;
        if result.describe.is_empty() {
            result.describe = extract_doc_lines(attrs);
        }
        Ok(result)
    }
}

/// Variant-level attributes.
///
/// - `name = "..."` - the setting this variant is written as
#[derive(Debug, Default)]
pub struct VariantAttrs {
    pub name: Option<String>,
}

impl VariantAttrs {
    pub fn from_ast(attrs: &[Attribute]) -> syn::Result<Self> {
        parse_config_attrs(attrs, |result: &mut Self, meta| {
            if meta.path.is_ident("name") {
                result.name = Some(parse_str_value(meta)?);
                Ok(())
            } else {
                Err(meta.error("unknown variant attribute"))
            }
        })
    }
}

/// Collects doc comment lines, without the leading space rustdoc adds.
pub fn extract_doc_lines(attrs: &[Attribute]) -> Vec<String> {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            syn::Meta::NameValue(meta) => match &meta.value {
                Expr::Lit(syn::ExprLit {
                    lit: Lit::Str(lit_str),
                    ..
                }) => Some(lit_str.value()),
                _ => None,
            },
            _ => None,
        })
        .map(|line| line.strip_prefix(' ').map(str::to_string).unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .collect()
}

// =============================================================================
// Helper functions
// =============================================================================

/// Runs `handler` on every item of every `#[config(...)]` attribute.
fn parse_config_attrs<T, F>(attrs: &[Attribute], mut handler: F) -> syn::Result<T>
where
    T: Default,
    F: FnMut(&mut T, &ParseNestedMeta<'_>) -> syn::Result<()>,
{
    let mut result = T::default();
    for attr in attrs {
        if !attr.path().is_ident("config") {
            continue;
        }
        attr.parse_nested_meta(|meta| handler(&mut result, &meta))?;
    }
    Ok(result)
}

fn parse_str_value(meta: &ParseNestedMeta<'_>) -> syn::Result<String> {
    let lit: LitStr = meta.value()?.parse()?;
    Ok(lit.value())
}

/// Accepts either a bare path or a string literal holding one.
fn parse_path_value(meta: &ParseNestedMeta<'_>) -> syn::Result<ExprPath> {
    let expr: Expr = meta.value()?.parse()?;
    match expr {
        Expr::Path(path) => Ok(path),
        Expr::Lit(syn::ExprLit {
            lit: Lit::Str(lit_str),
            ..
        }) => lit_str
            .parse()
            .map_err(|_| syn::Error::new_spanned(&lit_str, format!("invalid path: {}", lit_str.value()))),
        other => Err(syn::Error::new_spanned(other, "expected path or string literal")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_field(input: syn::DeriveInput) -> syn::Field {
        match input.data {
            syn::Data::Struct(data) => data.fields.into_iter().next().unwrap(),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_field_attrs() {
        let field = first_field(syn::parse_quote! {
            struct S {
                /// Upper bound
                #[config(name = "max", alias = "limit", alias = "cap", validate = "range=1|", silent)]
                #[config(optional, fallback(distinct = "property"), denormalize_with = parse_limit, denormalize_strategy = "after")]
                max_value: u32,
            }
        });
        let attrs = FieldAttrs::from_ast(&field.attrs).unwrap();
        assert_eq!(attrs.names, ["max"]);
        assert_eq!(attrs.aliases, ["limit", "cap"]);
        assert_eq!(attrs.describe, ["Upper bound"]);
        assert_eq!(attrs.validate.as_deref(), Some("range=1|"));
        assert!(attrs.silent && attrs.optional);
        assert_eq!(attrs.fallback, Some(Distinct::Property));
        assert!(attrs.denormalize_with.is_some());
        assert_eq!(attrs.denormalize_strategy, DenormalizeStrategy::After);
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let field = first_field(syn::parse_quote! {
            struct S {
                #[config(rename = "x")]
                x: u32,
            }
        });
        let err = FieldAttrs::from_ast(&field.attrs).unwrap_err();
        assert_eq!(err.to_string(), "unknown field attribute");

        let input: syn::DeriveInput = syn::parse_quote! {
            #[config(naming = "SCREAMING")]
            struct S;
        };
        let err = ContainerAttrs::from_ast(&input.attrs).unwrap_err();
        assert_eq!(err.to_string(), "unknown naming policy: SCREAMING");
    }

    #[test]
    fn test_container_attrs() {
        let input: syn::DeriveInput = syn::parse_quote! {
            #[config(naming = "kebab-case", post_construct = "hooks::finish", post_construct = check)]
            #[config(constructor = Self::empty)]
            struct S;
        };
        let attrs = ContainerAttrs::from_ast(&input.attrs).unwrap();
        assert_eq!(attrs.naming, Some(Naming::KebabCase));
        assert_eq!(attrs.post_construct.len(), 2);
        assert!(attrs.constructor.is_some());
    }
}
