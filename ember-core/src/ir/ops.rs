//! Operators, builtin functions and shader interface attributes.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    And,
    Or,
    Xor,
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
    LessThanEqual,
    GreaterThanEqual,
    ShiftLeft,
    ShiftRight,
    /// Short-circuiting `&&`; lowered to control flow before code generation.
    LogicalAnd,
    /// Short-circuiting `||`; lowered to control flow before code generation.
    LogicalOr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Complement,
    Negation,
    Not,
}

/// Target-independent builtin functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuiltinFn {
    Abs,
    Acos,
    Acosh,
    All,
    Any,
    Asin,
    Asinh,
    Atan,
    Atan2,
    Atanh,
    Ceil,
    Clamp,
    Cos,
    Cosh,
    CountOneBits,
    Cross,
    Degrees,
    Determinant,
    Distance,
    Dpdx,
    DpdxCoarse,
    DpdxFine,
    Dpdy,
    DpdyCoarse,
    DpdyFine,
    Exp,
    Exp2,
    ExtractBits,
    FaceForward,
    Floor,
    Fma,
    Fract,
    Frexp,
    Fwidth,
    FwidthCoarse,
    FwidthFine,
    InsertBits,
    InverseSqrt,
    Ldexp,
    Length,
    Log,
    Log2,
    Max,
    Min,
    Mix,
    Modf,
    Normalize,
    Pack2x16Float,
    Pack2x16Snorm,
    Pack2x16Unorm,
    Pack4x8Snorm,
    Pack4x8Unorm,
    Pow,
    QuantizeToF16,
    Radians,
    Reflect,
    Refract,
    ReverseBits,
    Round,
    Sign,
    Sin,
    Sinh,
    Smoothstep,
    Sqrt,
    Step,
    StorageBarrier,
    SubgroupBallot,
    SubgroupBroadcast,
    Tan,
    Tanh,
    TextureBarrier,
    TextureNumLevels,
    TextureNumSamples,
    Transpose,
    Trunc,
    Unpack2x16Float,
    Unpack2x16Snorm,
    Unpack2x16Unorm,
    Unpack4x8Snorm,
    Unpack4x8Unorm,
    WorkgroupBarrier,
    // The builtins below are rewritten into SPIR-V builtins or plain instructions
    // before code generation.
    ArrayLength,
    AtomicAdd,
    CountLeadingZeros,
    Dot,
    FirstLeadingBit,
    Select,
    TextureDimensions,
    TextureLoad,
    TextureSample,
    TextureStore,
}

impl fmt::Display for BuiltinFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = format!("{:?}", self);
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => write!(f, "{}{}", first.to_ascii_lowercase(), chars.as_str()),
            None => Ok(()),
        }
    }
}

/// Builtins that map one-to-one onto SPIR-V instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpirvBuiltinFn {
    None,
    ArrayLength,
    AtomicIAdd,
    AtomicISub,
    AtomicAnd,
    AtomicCompareExchange,
    AtomicExchange,
    AtomicLoad,
    AtomicOr,
    AtomicSMax,
    AtomicSMin,
    AtomicStore,
    AtomicUMax,
    AtomicUMin,
    AtomicXor,
    Dot,
    ImageDrefGather,
    ImageFetch,
    ImageGather,
    ImageQuerySize,
    ImageQuerySizeLod,
    ImageRead,
    ImageSampleImplicitLod,
    ImageSampleExplicitLod,
    ImageSampleDrefImplicitLod,
    ImageSampleDrefExplicitLod,
    ImageWrite,
    MatrixTimesMatrix,
    MatrixTimesScalar,
    MatrixTimesVector,
    SampledImage,
    SDot,
    Select,
    UDot,
    VectorTimesMatrix,
    VectorTimesScalar,
}

/// Pipeline builtin values attached to shader IO variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuiltinValue {
    Undefined,
    FragDepth,
    FrontFacing,
    GlobalInvocationId,
    InstanceIndex,
    LocalInvocationId,
    LocalInvocationIndex,
    NumWorkgroups,
    PointSize,
    Position,
    SampleIndex,
    SampleMask,
    SubgroupInvocationId,
    SubgroupSize,
    VertexIndex,
    WorkgroupId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterpolationType {
    Perspective,
    Linear,
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterpolationSampling {
    Undefined,
    Center,
    Centroid,
    Sample,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interpolation {
    pub ty: InterpolationType,
    pub sampling: InterpolationSampling,
}

/// Shader interface attributes of an `in`/`out` variable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IoAttributes {
    pub location: Option<u32>,
    pub blend_src: Option<u32>,
    pub interpolation: Option<Interpolation>,
    pub builtin: Option<BuiltinValue>,
    pub invariant: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BindingPoint {
    pub group: u32,
    pub binding: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineStage {
    None,
    Vertex,
    Fragment,
    Compute,
}
