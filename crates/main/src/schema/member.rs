//! Member tables: what `#[derive(Configurable)]` emits for a struct.

use alloc::{boxed::Box, string::String, sync::Arc, vec::Vec};
use core::{fmt, marker::PhantomData};

use super::{
    ClassSchema, DenormalizeProcessor, DictionarySchema, Distinct, Modifiers, NamingPolicy,
    NormalizeProcessor,
    processor::{downcast, downcast_mut, mismatch},
};
use crate::{
    Dictionary, Result,
    context::Context,
    reflect::{FromReflect, Reflect},
    types::{Type, Typed},
};

/// A type whose settings are described by a member table.
///
/// Implemented by `#[derive(Configurable)]`.
pub trait Configurable: Typed + Reflect + Sized {
    fn declaration() -> Declaration;

    /// Creates the instance settings are written into.
    fn construct() -> Self;
}

/// Reads and writes one field of an owner instance.
pub trait Access: Send + Sync {
    /// Returns the field, or `None` when it holds no value.
    fn get<'a>(&self, owner: &'a dyn Reflect) -> Result<Option<&'a dyn Reflect>>;

    /// Stores `value` into the field. `None` clears a nullable field and
    /// leaves any other field untouched.
    fn set(&self, owner: &mut dyn Reflect, value: Option<Box<dyn Reflect>>) -> Result<()>;

    /// Whether the field can hold no value.
    fn is_nullable(&self) -> bool;
}

/// A field of type `T`.
pub struct Required<O, T> {
    get: fn(&O) -> &T,
    get_mut: fn(&mut O) -> &mut T,
}

impl<O: Reflect, T: FromReflect> Access for Required<O, T> {
    fn get<'a>(&self, owner: &'a dyn Reflect) -> Result<Option<&'a dyn Reflect>> {
        Ok(Some((self.get)(downcast::<O>(owner)?)))
    }

    fn set(&self, owner: &mut dyn Reflect, value: Option<Box<dyn Reflect>>) -> Result<()> {
        let Some(value) = value else {
            return Ok(());
        };
        let value = T::take_from_reflect(value).map_err(|v| mismatch::<T>(&*v))?;
        *(self.get_mut)(downcast_mut::<O>(owner)?) = value;
        Ok(())
    }

    fn is_nullable(&self) -> bool {
        false
    }
}

/// A field of type `Option<T>`.
pub struct Nullable<O, T> {
    get: fn(&O) -> &Option<T>,
    get_mut: fn(&mut O) -> &mut Option<T>,
}

impl<O: Reflect, T: FromReflect> Access for Nullable<O, T> {
    fn get<'a>(&self, owner: &'a dyn Reflect) -> Result<Option<&'a dyn Reflect>> {
        Ok((self.get)(downcast::<O>(owner)?)
            .as_ref()
            .map(|v| v as &dyn Reflect))
    }

    fn set(&self, owner: &mut dyn Reflect, value: Option<Box<dyn Reflect>>) -> Result<()> {
        let value = value
            .map(|v| T::take_from_reflect(v).map_err(|v| mismatch::<T>(&*v)))
            .transpose()?;
        *(self.get_mut)(downcast_mut::<O>(owner)?) = value;
        Ok(())
    }

    fn is_nullable(&self) -> bool {
        true
    }
}

#[derive(Clone)]
pub struct Accessor(Arc<dyn Access>);

impl Accessor {
    pub fn new(access: impl Access + 'static) -> Self {
        Self(Arc::new(access))
    }

    #[must_use]
    pub fn required<O: Reflect, T: FromReflect>(
        get: fn(&O) -> &T,
        get_mut: fn(&mut O) -> &mut T,
    ) -> Self {
        Self::new(Required { get, get_mut })
    }

    #[must_use]
    pub fn nullable<O: Reflect, T: FromReflect>(
        get: fn(&O) -> &Option<T>,
        get_mut: fn(&mut O) -> &mut Option<T>,
    ) -> Self {
        Self::new(Nullable { get, get_mut })
    }

    pub fn get<'a>(&self, owner: &'a dyn Reflect) -> Result<Option<&'a dyn Reflect>> {
        self.0.get(owner)
    }

    pub fn set(&self, owner: &mut dyn Reflect, value: Option<Box<dyn Reflect>>) -> Result<()> {
        self.0.set(owner, value)
    }

    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.0.is_nullable()
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.is_nullable() {
            "Accessor(nullable)"
        } else {
            "Accessor(required)"
        })
    }
}

/// The declared form of one field, before naming is resolved.
#[derive(Debug, Clone)]
pub struct Member {
    pub(crate) ident: &'static str,
    pub(crate) ty: Type,
    pub(crate) accessor: Accessor,
    pub(crate) names: Vec<String>,
    pub(crate) aliases: Vec<String>,
    pub(crate) description: Vec<String>,
    pub(crate) validation: Option<String>,
    pub(crate) silent: bool,
    pub(crate) modifiers: Modifiers,
    pub(crate) distinct: Distinct,
    pub(crate) excluded: bool,
    pub(crate) normalizer: Option<NormalizeProcessor>,
    pub(crate) denormalizer: Option<DenormalizeProcessor>,
    pub(crate) dictionary_schema: Option<fn() -> Result<DictionarySchema>>,
}

impl Member {
    #[must_use]
    pub fn new(ident: &'static str, ty: Type, accessor: Accessor) -> Self {
        Self {
            ident,
            ty,
            accessor,
            names: Vec::new(),
            aliases: Vec::new(),
            description: Vec::new(),
            validation: None,
            silent: false,
            modifiers: Modifiers::empty(),
            distinct: Distinct::default(),
            excluded: false,
            normalizer: None,
            denormalizer: None,
            dictionary_schema: None,
        }
    }

    /// A field of type `T`, declared as `T`'s own descriptor.
    #[must_use]
    pub fn field<O, T>(ident: &'static str, get: fn(&O) -> &T, get_mut: fn(&mut O) -> &mut T) -> Self
    where
        O: Reflect,
        T: Typed + FromReflect,
    {
        Self::new(ident, T::type_descriptor(), Accessor::required(get, get_mut))
    }

    /// A field of type `Option<T>`, declared as `T`'s own descriptor.
    #[must_use]
    pub fn nullable_field<O, T>(
        ident: &'static str,
        get: fn(&O) -> &Option<T>,
        get_mut: fn(&mut O) -> &mut Option<T>,
    ) -> Self
    where
        O: Reflect,
        T: Typed + FromReflect,
    {
        Self::new(ident, T::type_descriptor(), Accessor::nullable(get, get_mut))
    }

    #[must_use]
    pub fn ident(&self) -> &'static str {
        self.ident
    }

    /// Overrides the declared type, e.g. with a type variable.
    #[must_use]
    pub fn with_type(mut self, ty: Type) -> Self {
        self.ty = ty;
        self
    }

    /// Adds a candidate setting name. The first usable one becomes primary.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.names.push(name.into());
        self
    }

    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    #[must_use]
    pub fn describe(mut self, line: impl Into<String>) -> Self {
        self.description.push(line.into());
        self
    }

    #[must_use]
    pub fn validate(mut self, expression: impl Into<String>) -> Self {
        self.validation = Some(expression.into());
        self
    }

    /// Turns validation failures into skipping the property.
    #[must_use]
    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.modifiers |= Modifiers::OPTIONAL;
        self
    }

    #[must_use]
    pub fn transient(mut self) -> Self {
        self.modifiers |= Modifiers::TRANSIENT;
        self
    }

    #[must_use]
    pub fn constant(mut self) -> Self {
        self.modifiers |= Modifiers::CONSTANT;
        self
    }

    #[must_use]
    pub fn fallback(mut self, distinct: Distinct) -> Self {
        self.modifiers |= Modifiers::FALLBACK;
        self.distinct = distinct;
        self
    }

    /// Leaves the field out of the schema entirely.
    #[must_use]
    pub fn exclude(mut self) -> Self {
        self.excluded = true;
        self
    }

    #[must_use]
    pub fn normalize_with(mut self, processor: NormalizeProcessor) -> Self {
        self.normalizer = Some(processor);
        self
    }

    #[must_use]
    pub fn denormalize_with(mut self, processor: DenormalizeProcessor) -> Self {
        self.denormalizer = Some(processor);
        self
    }

    /// Constrains a [`Dictionary`] field by a hand-built schema.
    #[must_use]
    pub fn dictionary_schema(mut self, schema: fn() -> Result<DictionarySchema>) -> Self {
        self.dictionary_schema = Some(schema);
        self
    }
}

type HookFn = dyn Fn(&mut dyn Reflect, &Context<'_>, &ClassSchema, &Dictionary) -> Result<()> + Send + Sync;

/// A function run on an instance once all its properties are set.
#[derive(Clone)]
pub struct PostHook(Arc<HookFn>);

impl PostHook {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut dyn Reflect, &Context<'_>, &ClassSchema, &Dictionary) -> Result<()>
            + Send
            + Sync
            + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(
        &self,
        owner: &mut dyn Reflect,
        ctx: &Context<'_>,
        schema: &ClassSchema,
        dictionary: &Dictionary,
    ) -> Result<()> {
        (self.0)(owner, ctx, schema, dictionary)
    }
}

impl fmt::Debug for PostHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PostHook")
    }
}

/// What a post-construct hook may return.
pub trait HookOutput {
    fn into_result(self) -> Result<()>;
}

impl HookOutput for () {
    fn into_result(self) -> Result<()> {
        Ok(())
    }
}

impl HookOutput for Result<()> {
    fn into_result(self) -> Result<()> {
        self
    }
}

/// Conversion of a function into a [`PostHook`].
///
/// Implemented for functions taking `&mut O` followed by up to three of
/// `&Context`, `&ClassSchema` and `&Dictionary`, in that order.
pub trait IntoPostHook<O, Marker> {
    fn into_post_hook(self) -> PostHook;
}

#[doc(hidden)]
pub struct HookMarker<Args, R>(PhantomData<fn(Args) -> R>);

impl<O, R, F> IntoPostHook<O, HookMarker<(), R>> for F
where
    O: Reflect,
    R: HookOutput,
    F: Fn(&mut O) -> R + Send + Sync + 'static,
{
    fn into_post_hook(self) -> PostHook {
        PostHook::new(move |owner, _, _, _| self(downcast_mut::<O>(owner)?).into_result())
    }
}

impl<O, R, F> IntoPostHook<O, HookMarker<(Context<'static>,), R>> for F
where
    O: Reflect,
    R: HookOutput,
    F: Fn(&mut O, &Context<'_>) -> R + Send + Sync + 'static,
{
    fn into_post_hook(self) -> PostHook {
        PostHook::new(move |owner, ctx, _, _| self(downcast_mut::<O>(owner)?, ctx).into_result())
    }
}

impl<O, R, F> IntoPostHook<O, HookMarker<(Context<'static>, ClassSchema), R>> for F
where
    O: Reflect,
    R: HookOutput,
    F: Fn(&mut O, &Context<'_>, &ClassSchema) -> R + Send + Sync + 'static,
{
    fn into_post_hook(self) -> PostHook {
        PostHook::new(move |owner, ctx, schema, _| {
            self(downcast_mut::<O>(owner)?, ctx, schema).into_result()
        })
    }
}

impl<O, R, F> IntoPostHook<O, HookMarker<(Context<'static>, ClassSchema, Dictionary), R>> for F
where
    O: Reflect,
    R: HookOutput,
    F: Fn(&mut O, &Context<'_>, &ClassSchema, &Dictionary) -> R + Send + Sync + 'static,
{
    fn into_post_hook(self) -> PostHook {
        PostHook::new(move |owner, ctx, schema, dictionary| {
            self(downcast_mut::<O>(owner)?, ctx, schema, dictionary).into_result()
        })
    }
}

/// The member table of a type.
#[derive(Debug, Clone, Default)]
pub struct Declaration {
    pub(crate) naming: Option<NamingPolicy>,
    pub(crate) members: Vec<Member>,
    pub(crate) post_construct: Vec<PostHook>,
}

impl Declaration {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the factory's naming policy for this type.
    #[must_use]
    pub fn naming(mut self, policy: NamingPolicy) -> Self {
        self.naming = Some(policy);
        self
    }

    #[must_use]
    pub fn member(mut self, member: Member) -> Self {
        self.members.push(member);
        self
    }

    #[must_use]
    pub fn post_construct<O, M>(mut self, hook: impl IntoPostHook<O, M>) -> Self {
        self.post_construct.push(hook.into_post_hook());
        self
    }

    #[must_use]
    pub fn members(&self) -> &[Member] {
        &self.members
    }
}
