//! Sample IR modules for `ember example`.

use clap::ValueEnum;
use ember_core::ir::builder::{BuildResult, Builder};
use ember_core::ir::{
    Access, AddressSpace, BinaryOp, BindingPoint, BuiltinFn, BuiltinValue, IoAttributes, Module, PipelineStage,
    StructDef, StructMember, Type, VarInst,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Sample {
    /// `fn main() -> f32 { return 1.0 + 2.0; }`
    Sum,
    /// Compute shader doubling each element of a storage buffer
    Double,
    /// Fragment shader choosing a color with an if
    Stripes,
    /// Loop summing the integers below 10
    Count,
}

impl Sample {
    pub fn build(self) -> BuildResult<Module> {
        let mut module = Module::new();
        let mut b = Builder::new(&mut module);
        match self {
            Sample::Sum => sum(&mut b)?,
            Sample::Double => double(&mut b)?,
            Sample::Stripes => stripes(&mut b)?,
            Sample::Count => count(&mut b)?,
        }
        Ok(module)
    }
}

fn sum(b: &mut Builder<'_>) -> BuildResult<()> {
    b.function("main", Type::F32, PipelineStage::None);
    let one = b.f32(1.0);
    let two = b.f32(2.0);
    let sum = b.binary(BinaryOp::Add, Type::F32, one, two)?;
    b.return_(Some(sum))
}

fn double(b: &mut Builder<'_>) -> BuildResult<()> {
    let buffer = b.add_struct(StructDef {
        name: Some("Buffer".to_string()),
        members: vec![StructMember {
            name: Some("data".to_string()),
            ty: Type::runtime_array(Type::U32, 4),
            offset: 0,
        }],
        block: true,
    });
    let buffer = b.var(
        Type::ptr(AddressSpace::Storage, buffer, Access::ReadWrite),
        VarInst {
            binding_point: Some(BindingPoint { group: 0, binding: 0 }),
            ..VarInst::default()
        },
    )?;
    b.set_name(buffer, "buffer");
    let id = b.var(
        Type::ptr(AddressSpace::In, Type::vec(Type::U32, 3), Access::Read),
        VarInst {
            attributes: IoAttributes {
                builtin: Some(BuiltinValue::GlobalInvocationId),
                ..IoAttributes::default()
            },
            ..VarInst::default()
        },
    )?;

    b.compute_function("main", [64, 1, 1]);
    let id = b.load(id)?;
    let zero = b.u32(0);
    let index = b.access(Type::U32, id, vec![zero])?;
    let element = b.access(
        Type::ptr(AddressSpace::Storage, Type::U32, Access::ReadWrite),
        buffer,
        vec![zero, index],
    )?;
    let value = b.load(element)?;
    let two = b.u32(2);
    let doubled = b.binary(BinaryOp::Multiply, Type::U32, value, two)?;
    b.store(element, doubled)?;
    b.return_(None)
}

fn stripes(b: &mut Builder<'_>) -> BuildResult<()> {
    let color = Type::vec(Type::F32, 4);
    let coord = b.var(
        Type::ptr(AddressSpace::In, color.clone(), Access::Read),
        VarInst {
            attributes: IoAttributes {
                builtin: Some(BuiltinValue::Position),
                ..IoAttributes::default()
            },
            ..VarInst::default()
        },
    )?;
    let out = b.var(
        Type::ptr(AddressSpace::Out, color.clone(), Access::Write),
        VarInst {
            attributes: IoAttributes {
                location: Some(0),
                ..IoAttributes::default()
            },
            ..VarInst::default()
        },
    )?;

    b.function("main", Type::Void, PipelineStage::Fragment);
    let coord = b.load(coord)?;
    let zero = b.u32(0);
    let x = b.access(Type::F32, coord, vec![zero])?;
    let width = b.f32(16.0);
    let cell = b.binary(BinaryOp::Divide, Type::F32, x, width)?;
    let cell = b.builtin(Type::F32, BuiltinFn::Floor, vec![cell])?;
    let two = b.f32(2.0);
    let parity = b.binary(BinaryOp::Modulo, Type::F32, cell, two)?;
    let one = b.f32(1.0);
    let odd = b.binary(BinaryOp::Equal, Type::Bool, parity, one)?;
    let after = b.current_block();

    let handle = b.if_(odd, vec![color.clone()])?;
    let on = b.constants().f32(1.0);
    let off = b.constants().f32(0.0);
    b.switch_to_block(handle.true_block);
    let white = b.splat(color.clone(), on, 4);
    b.exit_if(handle.inst, vec![white])?;
    b.switch_to_block(handle.false_block);
    let black = b.composite(color, vec![off, off, off, on]);
    b.exit_if(handle.inst, vec![black])?;

    if let Some(block) = after {
        b.switch_to_block(block);
    }
    b.store(out, handle.results[0])?;
    b.return_(None)
}

fn count(b: &mut Builder<'_>) -> BuildResult<()> {
    b.function("count", Type::I32, PipelineStage::None);
    let after = b.current_block();
    let handle = b.loop_(vec![Type::I32])?;

    let init = b.loop_initializer(handle.inst)?;
    b.switch_to_block(init);
    let zero = b.i32(0);
    b.next_iteration(handle.inst, vec![zero, zero])?;

    let i = b.block_param(handle.body, Type::I32);
    let total = b.block_param(handle.body, Type::I32);
    b.switch_to_block(handle.body);
    let total = b.binary(BinaryOp::Add, Type::I32, total, i)?;
    b.continue_(handle.inst, vec![i, total])?;

    let i = b.block_param(handle.continuing, Type::I32);
    let total = b.block_param(handle.continuing, Type::I32);
    b.switch_to_block(handle.continuing);
    let one = b.i32(1);
    let next = b.binary(BinaryOp::Add, Type::I32, i, one)?;
    let ten = b.i32(10);
    let done = b.binary(BinaryOp::GreaterThanEqual, Type::Bool, next, ten)?;
    b.break_if(handle.inst, done, vec![next, total], vec![total])?;

    if let Some(block) = after {
        b.switch_to_block(block);
    }
    b.return_(Some(handle.results[0]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_lower() {
        for sample in Sample::value_variants() {
            let module = sample.build().unwrap();
            let words = ember_core::generate(&module, &ember_core::Options::default()).unwrap();
            rspirv::dr::load_words(&words).unwrap();
        }
    }
}
