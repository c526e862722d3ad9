//! End-to-end check that a function built through `FuncBuilder` actually
//! runs: compile `fn add(a: i32, b: i32) -> i32 { a + b }` with a real JIT
//! backend and call it.
use cranelift_jit::{JITBuilder, JITModule};
use cranelift_module::{default_libcall_names, Linkage, Module};
use vkcpu_ir::builder::FuncBuilder;
use vkcpu_ir::module::IrModule;
use vkcpu_ir::op::IrOp;
use vkcpu_ir::types::IrType;

#[test]
fn add_function_runs_through_the_jit() {
    let builder = JITBuilder::new(default_libcall_names()).expect("host ISA not supported");
    let jit = JITModule::new(builder);
    let mut module = IrModule::new(jit);

    let i32_ty = IrType::Int(32);
    let id = module
        .declare_function("add", &[i32_ty.clone(), i32_ty.clone()], &[i32_ty.clone()], Linkage::Export)
        .unwrap();

    let call_conv = module.inner().isa().default_call_conv();
    let clif_sig = vkcpu_ir::builder::make_signature(call_conv, &[i32_ty.clone(), i32_ty.clone()], &[i32_ty.clone()]);

    module
        .define_function(id, clif_sig, |_module, func, fctx| {
            let mut fb = FuncBuilder::new(func, fctx);
            let entry = fb.create_block();
            let a = fb.append_block_param(entry, &i32_ty);
            let b = fb.append_block_param(entry, &i32_ty);
            fb.switch_to_block(entry);
            fb.seal_block(entry);
            let sum = fb.binary(IrOp::IAdd, a, b);
            fb.ret(&[sum]);
            fb.finalize();
        })
        .unwrap();

    module.finalize_definitions().unwrap();

    let code = module.inner().get_finalized_function(id);
    let add_fn = unsafe { std::mem::transmute::<_, extern "C" fn(i32, i32) -> i32>(code) };
    assert_eq!(add_fn(2, 40), 42);
}
