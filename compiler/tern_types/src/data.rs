//! Type descriptors stored in the arena.
//!
//! `TypeData` is a closed sum type; every component matches on it
//! exhaustively, so adding a descriptor kind is a compile error everywhere a
//! matcher forgets it. Children are referenced by [`TypeId`], never boxed.

use tern_ir::{EffectRow, Name, PackageId, SymbolRef};

use crate::{TypeId, TypeParamId};

/// Builtin primitive kinds, one canonical id each.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Primitive {
    I32,
    I64,
    F32,
    F64,
    Bool,
    String,
    Void,
    /// The absent value of an optional (`T | None`).
    None,
    Never,
}

impl Primitive {
    /// All primitives in pre-interning order.
    pub const ALL: [Primitive; 9] = [
        Primitive::I32,
        Primitive::I64,
        Primitive::F32,
        Primitive::F64,
        Primitive::Bool,
        Primitive::String,
        Primitive::Void,
        Primitive::None,
        Primitive::Never,
    ];

    /// Source spelling of the primitive.
    pub fn name(self) -> &'static str {
        match self {
            Primitive::I32 => "i32",
            Primitive::I64 => "i64",
            Primitive::F32 => "f32",
            Primitive::F64 => "f64",
            Primitive::Bool => "bool",
            Primitive::String => "string",
            Primitive::Void => "void",
            Primitive::None => "None",
            Primitive::Never => "never",
        }
    }

    /// Look up a primitive by its source spelling.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// The fixed id this primitive is interned at.
    pub fn type_id(self) -> TypeId {
        match self {
            Primitive::I32 => TypeId::I32,
            Primitive::I64 => TypeId::I64,
            Primitive::F32 => TypeId::F32,
            Primitive::F64 => TypeId::F64,
            Primitive::Bool => TypeId::BOOL,
            Primitive::String => TypeId::STRING,
            Primitive::Void => TypeId::VOID,
            Primitive::None => TypeId::NONE,
            Primitive::Never => TypeId::NEVER,
        }
    }
}

/// Visibility of a declaration or field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Visibility {
    /// Visible only within the declaring module.
    #[default]
    Module,
    /// Visible within the declaring package.
    Package,
    /// Visible everywhere.
    Public,
}

/// A field of a structural object type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StructField {
    pub name: Name,
    pub ty: TypeId,
    pub optional: bool,
    pub visibility: Visibility,
    /// Declaration that introduced the field (object or intersection base).
    pub owner: Option<SymbolRef>,
    pub package: Option<PackageId>,
    /// Type parameters of the owning declaration that occur in `ty`.
    ///
    /// Instantiation must eliminate all of them before the owning type is
    /// considered resolved.
    pub declaring_params: Box<[TypeParamId]>,
}

impl StructField {
    /// A required public field without declaration metadata.
    pub fn new(name: Name, ty: TypeId) -> Self {
        StructField {
            name,
            ty,
            optional: false,
            visibility: Visibility::Public,
            owner: None,
            package: None,
            declaring_params: Box::default(),
        }
    }

    /// Mark the field optional.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Same field with a different type; metadata is kept.
    #[must_use]
    pub fn with_type(&self, ty: TypeId) -> Self {
        StructField { ty, ..self.clone() }
    }
}

/// A parameter of a function type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FnParam {
    pub ty: TypeId,
    pub label: Option<Name>,
    pub optional: bool,
}

impl FnParam {
    /// Unlabeled required parameter.
    pub fn positional(ty: TypeId) -> Self {
        FnParam {
            ty,
            label: None,
            optional: false,
        }
    }

    /// Labeled required parameter.
    pub fn labeled(label: Name, ty: TypeId) -> Self {
        FnParam {
            ty,
            label: Some(label),
            optional: false,
        }
    }
}

/// Type descriptor stored in the arena.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeData {
    /// Builtin leaf type.
    Primitive(Primitive),

    /// Placeholder for an undetermined type.
    Unknown,

    /// Reference to a not-yet-bound generic parameter.
    TypeParam(TypeParamId),

    /// Identity of a user object type, independent of its fields.
    Nominal {
        owner: SymbolRef,
        name: Name,
        args: Box<[TypeId]>,
    },

    /// Row-typed record. Fields are sorted by name.
    Structural { fields: Box<[StructField]> },

    /// Identity of a trait, used for trait-object values.
    Trait {
        owner: SymbolRef,
        name: Name,
        args: Box<[TypeId]>,
    },

    /// Function type with its effect row.
    Function {
        params: Box<[FnParam]>,
        ret: TypeId,
        effects: EffectRow,
    },

    /// Union. Members are flattened, sorted and unique, at least two.
    Union(Box<[TypeId]>),

    /// Intersection of at most one nominal, one structural and any traits.
    Intersection {
        nominal: Option<TypeId>,
        structural: Option<TypeId>,
        traits: Box<[TypeId]>,
    },

    /// Fixed-size array.
    FixedArray(TypeId),

    /// Self-referential type; `binder` stands for the whole type in `body`.
    Recursive { binder: TypeParamId, body: TypeId },
}

impl TypeData {
    /// Check if this is a primitive leaf.
    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeData::Primitive(_))
    }

    /// Fields of a structural descriptor.
    pub fn fields(&self) -> Option<&[StructField]> {
        match self {
            TypeData::Structural { fields } => Some(fields),
            _ => None,
        }
    }

    /// Short kind name for logs and internal panics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            TypeData::Primitive(_) => "primitive",
            TypeData::Unknown => "unknown",
            TypeData::TypeParam(_) => "type-param-ref",
            TypeData::Nominal { .. } => "nominal-object",
            TypeData::Structural { .. } => "structural-object",
            TypeData::Trait { .. } => "trait",
            TypeData::Function { .. } => "function",
            TypeData::Union(_) => "union",
            TypeData::Intersection { .. } => "intersection",
            TypeData::FixedArray(_) => "fixed-array",
            TypeData::Recursive { .. } => "recursive",
        }
    }
}
