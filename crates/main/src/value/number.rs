use core::{
    cmp::{Eq, Ordering},
    fmt,
    hash::{Hash, Hasher},
};

/// A wrapper for any numeric primitive type a simple value can hold.
///
/// Floats are wrapped in [`F32`] and [`F64`] so that `Number` (and therefore
/// [`Value`](super::Value)) can implement [`Eq`], [`Hash`] and [`Ord`].
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Eq, Hash, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Number {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(F32),
    F64(F64),
}

/// The storage width of a [`Number`], without its value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NumberKind {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

macro_rules! float_ty {
    ($ty:ident($float:ty)) => {
        #[doc = concat!("An [`", stringify!($float), "`] ordered by `total_cmp`, so it can be a map key.")]
        #[derive(Copy, Clone, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $ty(pub $float);

        impl $ty {
            #[must_use]
            pub fn get(self) -> $float {
                self.0
            }
        }

        impl From<$float> for $ty {
            fn from(value: $float) -> Self {
                Self(value)
            }
        }

        impl From<$float> for Number {
            fn from(value: $float) -> Self {
                Number::$ty($ty(value))
            }
        }

        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                self.0.total_cmp(&other.0).is_eq()
            }
        }

        impl Eq for $ty {}

        impl Hash for $ty {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.0.to_bits().hash(state);
            }
        }

        impl PartialOrd for $ty {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $ty {
            fn cmp(&self, other: &Self) -> Ordering {
                self.0.total_cmp(&other.0)
            }
        }
    };
}

float_ty! { F32(f32) }
float_ty! { F64(f64) }

impl Number {
    /// Construct a new number.
    pub fn new(v: impl Into<Number>) -> Self {
        v.into()
    }

    #[must_use]
    pub fn kind(&self) -> NumberKind {
        match self {
            Self::I8(_) => NumberKind::I8,
            Self::I16(_) => NumberKind::I16,
            Self::I32(_) => NumberKind::I32,
            Self::I64(_) => NumberKind::I64,
            Self::U8(_) => NumberKind::U8,
            Self::U16(_) => NumberKind::U16,
            Self::U32(_) => NumberKind::U32,
            Self::U64(_) => NumberKind::U64,
            Self::F32(_) => NumberKind::F32,
            Self::F64(_) => NumberKind::F64,
        }
    }

    #[must_use]
    pub fn is_float(&self) -> bool {
        matches!(self, Self::F32(_) | Self::F64(_))
    }

    /// The value as an [`f64`]. 64-bit integers may lose precision.
    ///
    /// ```
    /// # use dictum::value::Number;
    /// assert_eq!(Number::new(5_u16).into_f64(), 5.0);
    /// assert_eq!(Number::new(0.5_f32).into_f64(), 0.5);
    /// ```
    #[must_use]
    pub fn into_f64(self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        match self {
            Self::I8(v) => f64::from(v),
            Self::I16(v) => f64::from(v),
            Self::I32(v) => f64::from(v),
            Self::I64(v) => v as f64,
            Self::U8(v) => f64::from(v),
            Self::U16(v) => f64::from(v),
            Self::U32(v) => f64::from(v),
            Self::U64(v) => v as f64,
            Self::F32(v) => f64::from(v.get()),
            Self::F64(v) => v.get(),
        }
    }

    /// Returns the value as an [`i128`] if it is an integer. Floats return
    /// `None`; use [`Number::into_f64`] for them.
    #[must_use]
    pub fn as_i128(self) -> Option<i128> {
        match self {
            Self::I8(v) => Some(i128::from(v)),
            Self::I16(v) => Some(i128::from(v)),
            Self::I32(v) => Some(i128::from(v)),
            Self::I64(v) => Some(i128::from(v)),
            Self::U8(v) => Some(i128::from(v)),
            Self::U16(v) => Some(i128::from(v)),
            Self::U32(v) => Some(i128::from(v)),
            Self::U64(v) => Some(i128::from(v)),
            Self::F32(_) | Self::F64(_) => None,
        }
    }

    /// Whether the number is zero within `1e-8`.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.into_f64().abs() < 1e-8
    }
}

impl NumberKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            NumberKind::I8 => "i8",
            NumberKind::I16 => "i16",
            NumberKind::I32 => "i32",
            NumberKind::I64 => "i64",
            NumberKind::U8 => "u8",
            NumberKind::U16 => "u16",
            NumberKind::U32 => "u32",
            NumberKind::U64 => "u64",
            NumberKind::F32 => "f32",
            NumberKind::F64 => "f64",
        }
    }

    /// Whether every value of `self` is exactly representable as `target`.
    ///
    /// Integers widen to wider integers (unsigned into a strictly wider signed
    /// type as well), integers of at most 32 bits widen to `f64`, integers of
    /// at most 16 bits widen to `f32`, and `f32` widens to `f64`.
    #[must_use]
    pub fn widens_to(self, target: NumberKind) -> bool {
        use NumberKind::{F32, F64, I16, I32, I64, I8, U16, U32, U64, U8};

        if self == target {
            return true;
        }
        match (self, target) {
            (I8, I16 | I32 | I64 | F32 | F64)
            | (I16, I32 | I64 | F32 | F64)
            | (I32, I64 | F64)
            | (U8, U16 | U32 | U64 | I16 | I32 | I64 | F32 | F64)
            | (U16, U32 | U64 | I32 | I64 | F32 | F64)
            | (U32, U64 | I64 | F64)
            | (F32, F64) => true,
            _ => false,
        }
    }
}

impl fmt::Display for NumberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I8(v) => write!(f, "{v}"),
            Self::I16(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::U8(v) => write!(f, "{v}"),
            Self::U16(v) => write!(f, "{v}"),
            Self::U32(v) => write!(f, "{v}"),
            Self::U64(v) => write!(f, "{v}"),
            Self::F32(v) => write!(f, "{}", v.get()),
            Self::F64(v) => write!(f, "{}", v.get()),
        }
    }
}

macro_rules! integer_into_number {
    ($($variant:ident($ty:ty)),*) => {
        $(
            impl From<$ty> for Number {
                fn from(value: $ty) -> Self {
                    Number::$variant(value)
                }
            }
        )*
    };
}

integer_into_number!(I8(i8), I16(i16), I32(i32), I64(i64), U8(u8), U16(u16), U32(u32), U64(u64));
