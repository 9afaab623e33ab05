//! Package compilation.
//!
//! A package repository named `mylib.lib` carries its main file at
//! `<repo>/mylib.lib`. Compilation expands it into one self-contained
//! artifact and reports the version it declares.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::command;
use crate::error::{RegistryError, Result};
use crate::version::extract_version;

/// Output of a successful compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPackage {
    /// The single artifact copied into the registry.
    pub main_artifact: PathBuf,
    /// Version declared by the package.
    pub declared_version: String,
}

/// Builds a downloaded package into its publishable artifact.
pub trait Compiler {
    /// Compile the package checked out at `package_path`.
    fn compile(&self, package_path: &Path, package_name: &str) -> Result<CompiledPackage>;
}

/// `Compiler` driving the `faust` executable in source-expansion mode.
#[derive(Debug, Clone)]
pub struct FaustCompiler {
    program: String,
}

impl Default for FaustCompiler {
    fn default() -> Self {
        FaustCompiler::new("faust")
    }
}

impl FaustCompiler {
    /// Use the given compiler executable.
    pub fn new(program: impl Into<String>) -> Self {
        FaustCompiler {
            program: program.into(),
        }
    }
}

fn compile_error(package: &str, detail: impl Into<String>) -> RegistryError {
    RegistryError::Compile {
        package: package.to_string(),
        detail: detail.into(),
    }
}

impl Compiler for FaustCompiler {
    fn compile(&self, package_path: &Path, package_name: &str) -> Result<CompiledPackage> {
        let main = package_path.join(package_name);
        if !main.is_file() {
            return Err(compile_error(
                package_name,
                format!("main file {} not found", main.display()),
            ));
        }

        let build_dir = package_path.join("build");
        std::fs::create_dir_all(&build_dir)?;
        let artifact = build_dir.join(package_name);

        info!("compiling {}", main.display());
        let main_arg = main.to_string_lossy();
        let out_arg = artifact.to_string_lossy();
        command::run(
            &self.program,
            ["-e", &*main_arg, "-o", &*out_arg],
            Some(package_path),
        )
        .map_err(|detail| compile_error(package_name, detail))?;

        // Expansion may drop metadata, so fall back to the source declaration.
        let declared_version = match extract_version(&artifact)? {
            Some(version) => version,
            None => extract_version(&main)?
                .ok_or_else(|| compile_error(package_name, "no declared version"))?,
        };

        Ok(CompiledPackage {
            main_artifact: artifact,
            declared_version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_main_file_is_a_compile_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FaustCompiler::default()
            .compile(dir.path(), "mylib.lib")
            .unwrap_err();
        assert!(matches!(err, RegistryError::Compile { .. }));
    }

    #[test]
    fn missing_compiler_is_a_compile_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("mylib.lib"), "declare version \"1.0.0\";\n").unwrap();
        let err = FaustCompiler::new("definitely-not-a-faust-binary")
            .compile(dir.path(), "mylib.lib")
            .unwrap_err();
        assert!(matches!(err, RegistryError::Compile { .. }));
    }
}
