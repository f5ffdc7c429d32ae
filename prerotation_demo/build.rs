fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=assets/shaders/texture.vert");
    println!("cargo:rerun-if-changed=assets/shaders/texture.frag");

    #[cfg(feature = "compile-shaders")]
    compile_shaders();
}

/// Compile the GLSL sources to SPIR-V in OUT_DIR
#[cfg(feature = "compile-shaders")]
fn compile_shaders() {
    use std::{env, fs, path::PathBuf};

    let out = PathBuf::from(env::var("OUT_DIR").unwrap());
    let shaders = PathBuf::from("assets/shaders");

    let compiler = shaderc::Compiler::new().unwrap();
    let mut options = shaderc::CompileOptions::new().unwrap();
    options.set_target_env(
        shaderc::TargetEnv::Vulkan,
        shaderc::EnvVersion::Vulkan1_1 as u32,
    );
    options.set_optimization_level(shaderc::OptimizationLevel::Performance);

    for (file, kind) in [
        ("texture.vert", shaderc::ShaderKind::Vertex),
        ("texture.frag", shaderc::ShaderKind::Fragment),
    ] {
        let source = fs::read_to_string(shaders.join(file)).unwrap();
        let spirv = compiler
            .compile_into_spirv(&source, kind, file, "main", Some(&options))
            .unwrap_or_else(|e| panic!("failed to compile {file}: {e}"));
        fs::write(out.join(format!("{file}.spv")), spirv.as_binary_u8()).unwrap();
    }
}
