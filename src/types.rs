//! Primitive element types and their runtime descriptors.
//!
//! Columns are generic over a compile-time element type; the [`TypeRegistry`]
//! maps those types to runtime descriptors for code that has to reason about
//! them dynamically. The registry is an ordinary value: build one, pass it
//! where it is needed.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt::Debug;

use crate::memory::Pod;

/// Runtime tag for the primitive types a column can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveType {
    /// Placeholder for untyped null values (1 byte)
    Null,

    /// Boolean type (1 byte)
    Boolean,

    /// 8-bit signed integer
    TinyInt,

    /// 16-bit signed integer
    SmallInt,

    /// 32-bit signed integer
    Int,

    /// 64-bit signed integer
    BigInt,

    /// 32-bit floating point
    Float,

    /// 64-bit floating point
    Double,

    /// Fixed-width, zero-padded byte string
    FixedString,
}

impl PrimitiveType {
    /// All primitive types, in declaration order.
    pub const ALL: [PrimitiveType; 9] = [
        PrimitiveType::Null,
        PrimitiveType::Boolean,
        PrimitiveType::TinyInt,
        PrimitiveType::SmallInt,
        PrimitiveType::Int,
        PrimitiveType::BigInt,
        PrimitiveType::Float,
        PrimitiveType::Double,
        PrimitiveType::FixedString,
    ];

    /// Get the size of one element in bytes.
    ///
    /// Fixed strings carry their width per column, so they return `None`.
    pub fn size(&self) -> Option<usize> {
        match self {
            PrimitiveType::Null => Some(1),
            PrimitiveType::Boolean => Some(1),
            PrimitiveType::TinyInt => Some(1),
            PrimitiveType::SmallInt => Some(2),
            PrimitiveType::Int => Some(4),
            PrimitiveType::BigInt => Some(8),
            PrimitiveType::Float => Some(4),
            PrimitiveType::Double => Some(8),
            PrimitiveType::FixedString => None,
        }
    }

    /// Check if the type is numeric.
    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// Check if the type is integer.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            PrimitiveType::TinyInt
                | PrimitiveType::SmallInt
                | PrimitiveType::Int
                | PrimitiveType::BigInt
        )
    }

    /// Check if the type is floating point.
    pub fn is_float(&self) -> bool {
        matches!(self, PrimitiveType::Float | PrimitiveType::Double)
    }

    /// Lower-case SQL-style name of the type.
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveType::Null => "null",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::TinyInt => "tinyint",
            PrimitiveType::SmallInt => "smallint",
            PrimitiveType::Int => "int",
            PrimitiveType::BigInt => "bigint",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
            PrimitiveType::FixedString => "fixed_string",
        }
    }
}

/// Element types of a [`Column`](crate::Column) that support comparison,
/// sorting and selection.
pub trait Primitive: Pod + PartialEq + PartialOrd + Default + Debug {
    /// Runtime tag of the type, if the registry knows it.
    const TYPE: Option<PrimitiveType>;

    /// Total order used by `sort`. Floats order NaN after every number.
    fn total_cmp(&self, other: &Self) -> Ordering;
}

/// Element types that support elementwise arithmetic.
///
/// Integers wrap on overflow; floats follow IEEE-754. Integer division by
/// zero panics.
pub trait Numeric: Primitive {
    /// `lhs + rhs`
    fn add(lhs: Self, rhs: Self) -> Self;
    /// `lhs - rhs`
    fn sub(lhs: Self, rhs: Self) -> Self;
    /// `lhs * rhs`
    fn mul(lhs: Self, rhs: Self) -> Self;
    /// `lhs / rhs`
    fn div(lhs: Self, rhs: Self) -> Self;
    /// `-value`
    fn neg(value: Self) -> Self;
}

macro_rules! impl_integer {
    ($($t:ty => $tag:expr),* $(,)?) => {
        $(
            impl Primitive for $t {
                const TYPE: Option<PrimitiveType> = $tag;

                #[inline]
                fn total_cmp(&self, other: &Self) -> Ordering {
                    Ord::cmp(self, other)
                }
            }

            impl Numeric for $t {
                #[inline(always)]
                fn add(lhs: Self, rhs: Self) -> Self { lhs.wrapping_add(rhs) }
                #[inline(always)]
                fn sub(lhs: Self, rhs: Self) -> Self { lhs.wrapping_sub(rhs) }
                #[inline(always)]
                fn mul(lhs: Self, rhs: Self) -> Self { lhs.wrapping_mul(rhs) }
                #[inline(always)]
                fn div(lhs: Self, rhs: Self) -> Self { lhs.wrapping_div(rhs) }
                #[inline(always)]
                fn neg(value: Self) -> Self { value.wrapping_neg() }
            }
        )*
    };
}

macro_rules! impl_float {
    ($($t:ty => $tag:expr),* $(,)?) => {
        $(
            impl Primitive for $t {
                const TYPE: Option<PrimitiveType> = $tag;

                #[inline]
                fn total_cmp(&self, other: &Self) -> Ordering {
                    <$t>::total_cmp(self, other)
                }
            }

            impl Numeric for $t {
                #[inline(always)]
                fn add(lhs: Self, rhs: Self) -> Self { lhs + rhs }
                #[inline(always)]
                fn sub(lhs: Self, rhs: Self) -> Self { lhs - rhs }
                #[inline(always)]
                fn mul(lhs: Self, rhs: Self) -> Self { lhs * rhs }
                #[inline(always)]
                fn div(lhs: Self, rhs: Self) -> Self { lhs / rhs }
                #[inline(always)]
                fn neg(value: Self) -> Self { -value }
            }
        )*
    };
}

impl_integer!(
    i8 => Some(PrimitiveType::TinyInt),
    i16 => Some(PrimitiveType::SmallInt),
    i32 => Some(PrimitiveType::Int),
    i64 => Some(PrimitiveType::BigInt),
    u8 => None,
    u16 => None,
    u32 => None,
    u64 => None,
);

impl_float!(
    f32 => Some(PrimitiveType::Float),
    f64 => Some(PrimitiveType::Double),
);

impl Primitive for bool {
    const TYPE: Option<PrimitiveType> = Some(PrimitiveType::Boolean);

    #[inline]
    fn total_cmp(&self, other: &Self) -> Ordering {
        Ord::cmp(self, other)
    }
}

/// Runtime description of a primitive type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    /// The described type
    pub primitive: PrimitiveType,

    /// Display name
    pub name: &'static str,

    /// Element width in bytes, `None` when set per column
    pub width: Option<usize>,
}

impl TypeDescriptor {
    /// Create the default descriptor for a primitive type.
    pub fn new(primitive: PrimitiveType) -> Self {
        TypeDescriptor {
            primitive,
            name: primitive.name(),
            width: primitive.size(),
        }
    }
}

/// Lookup table from [`PrimitiveType`] to [`TypeDescriptor`].
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    descriptors: HashMap<PrimitiveType, TypeDescriptor>,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        TypeRegistry {
            descriptors: HashMap::new(),
        }
    }

    /// Create a registry holding the default descriptor of every primitive type.
    pub fn with_primitives() -> Self {
        let mut registry = TypeRegistry::new();
        for ty in PrimitiveType::ALL {
            registry.register(TypeDescriptor::new(ty));
        }
        registry
    }

    /// Register a descriptor, returning the one it replaces.
    pub fn register(&mut self, descriptor: TypeDescriptor) -> Option<TypeDescriptor> {
        self.descriptors.insert(descriptor.primitive, descriptor)
    }

    /// Get the descriptor of a primitive type.
    pub fn get(&self, ty: PrimitiveType) -> Option<&TypeDescriptor> {
        self.descriptors.get(&ty)
    }

    /// Get the descriptor matching a compile-time element type.
    pub fn descriptor_of<T: Primitive>(&self) -> Option<&TypeDescriptor> {
        T::TYPE.and_then(|ty| self.get(ty))
    }

    /// Get the number of registered types.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_covers_every_type() {
        let registry = TypeRegistry::with_primitives();
        assert_eq!(registry.len(), PrimitiveType::ALL.len());

        let int = registry.descriptor_of::<i32>().unwrap();
        assert_eq!(int.primitive, PrimitiveType::Int);
        assert_eq!(int.width, Some(4));

        assert!(registry.descriptor_of::<u32>().is_none());
        assert_eq!(registry.get(PrimitiveType::FixedString).unwrap().width, None);
    }

    #[test]
    fn registries_are_independent() {
        let mut custom = TypeRegistry::new();
        assert!(custom.is_empty());
        custom.register(TypeDescriptor {
            primitive: PrimitiveType::Double,
            name: "float8",
            width: Some(8),
        });

        let defaults = TypeRegistry::with_primitives();
        assert_eq!(custom.descriptor_of::<f64>().unwrap().name, "float8");
        assert_eq!(defaults.descriptor_of::<f64>().unwrap().name, "double");
    }

    #[test]
    fn classification() {
        assert!(PrimitiveType::BigInt.is_integer());
        assert!(PrimitiveType::Float.is_float());
        assert!(!PrimitiveType::Boolean.is_numeric());
        assert!(!PrimitiveType::FixedString.is_numeric());
    }

    #[test]
    fn integer_arithmetic_wraps() {
        assert_eq!(<i32 as Numeric>::add(i32::MAX, 1), i32::MIN);
        assert_eq!(<u8 as Numeric>::sub(0, 1), u8::MAX);
        assert_eq!(<i32 as Numeric>::div(i32::MIN, -1), i32::MIN);
        assert_eq!(<i64 as Numeric>::neg(i64::MIN), i64::MIN);
    }

    #[test]
    fn float_total_order_places_nan_last() {
        assert_eq!(Primitive::total_cmp(&f64::NAN, &1.0), Ordering::Greater);
        assert_eq!(Primitive::total_cmp(&-0.0f32, &0.0), Ordering::Less);
    }
}
