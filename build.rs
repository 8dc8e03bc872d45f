use eyre::{eyre, Result, WrapErr};
use std::path::PathBuf;

/// Compiles every GLSL shader under src/ to SPIR-V, next to its source, so
/// the render module can `include_spirv!` it.
fn main() -> Result<()> {
    let shaders: Vec<PathBuf> = glob::glob("src/**/*.vert")?
        .chain(glob::glob("src/**/*.frag")?)
        .collect::<Result<_, _>>()?;

    let mut compiler = shaderc::Compiler::new().ok_or_else(|| eyre!("Failed to create shaderc compiler"))?;

    for path in shaders {
        println!("cargo:rerun-if-changed={}", path.display());

        let kind = match path.extension().and_then(|e| e.to_str()) {
            Some("vert") => shaderc::ShaderKind::Vertex,
            Some("frag") => shaderc::ShaderKind::Fragment,
            _ => continue,
        };

        let source = std::fs::read_to_string(&path)
            .wrap_err_with(|| format!("Failed to read shader {:?}", path))?;

        let spirv = compiler
            .compile_into_spirv(
                &source,
                kind,
                path.to_str().ok_or_else(|| eyre!("Non-UTF8 shader path"))?,
                "main",
                None,
            )
            .wrap_err_with(|| format!("Failed to compile {:?}", path))?;

        let mut out = path.clone();
        let file_name = format!(
            "{}.spv",
            path.file_name().and_then(|n| n.to_str()).unwrap()
        );
        out.set_file_name(file_name);

        std::fs::write(&out, spirv.as_binary_u8())
            .wrap_err_with(|| format!("Failed to write {:?}", out))?;
    }

    Ok(())
}
