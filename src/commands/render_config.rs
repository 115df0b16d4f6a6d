use crate::context::Context;
use crate::template::{ConfigRenderer, to_yaml};
use anyhow::{Context as AnyhowContext, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Handles the 'render-config' command - merges config sources into one document
pub struct RenderConfigCommand;

impl RenderConfigCommand {
    /// Render `sources` in order and write the result to `output` (stdout when absent)
    pub fn execute(
        ctx: &Context,
        sources: &[PathBuf],
        output: Option<&Path>,
        debug: bool,
    ) -> Result<()> {
        let renderer = ConfigRenderer::new(Arc::clone(&ctx.fs), Arc::clone(&ctx.env));
        let merged = renderer.render_files(sources)?;
        let document = to_yaml(&merged)?;

        match output {
            Some(path) => {
                ctx.fs
                    .write(path, &document)
                    .with_context(|| format!("Failed to write rendered config to {:?}", path))?;

                if debug {
                    ctx.output.plain(&document);
                }
                ctx.output.success(&format!(
                    "Rendered {} source(s) into {}",
                    sources.len(),
                    path.display()
                ));
            }
            None => ctx.output.plain(&document),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::RenderError;
    use crate::traits::{MockEnvironment, MockFileSystem, MockOutput};

    fn paths(items: &[&str]) -> Vec<PathBuf> {
        items.iter().map(PathBuf::from).collect()
    }

    fn setup() -> (Arc<MockFileSystem>, Arc<MockOutput>, Context) {
        let fs = Arc::new(
            MockFileSystem::new()
                .with_file("/conf/000.yaml", "overriddenKey: v0\nlist: [a, b]\n")
                .with_file("/conf/001.yaml", "overriddenKey: v1\nserver: ${SERVER_NAME}\n"),
        );
        let env = Arc::new(MockEnvironment::new().with_var("SERVER_NAME", "example.com"));
        let output = Arc::new(MockOutput::new());
        let ctx = Context::test_with(fs.clone(), env, output.clone());
        (fs, output, ctx)
    }

    #[test]
    fn test_render_to_stdout() {
        let (_fs, output, ctx) = setup();

        RenderConfigCommand::execute(
            &ctx,
            &paths(&["/conf/000.yaml", "/conf/001.yaml"]),
            None,
            false,
        )
        .unwrap();

        assert_eq!(
            output.plain_text(),
            "overriddenKey: v1\nlist:\n- a\n- b\nserver: example.com\n"
        );
        assert!(output.get_successes().is_empty());
    }

    #[test]
    fn test_render_to_file() {
        let (fs, output, ctx) = setup();
        let target = Path::new("/out/homeserver.yaml");

        RenderConfigCommand::execute(
            &ctx,
            &paths(&["/conf/000.yaml", "/conf/001.yaml"]),
            Some(target),
            false,
        )
        .unwrap();

        let written = fs.get_file_contents(target).unwrap();
        assert!(written.contains("overriddenKey: v1"));
        assert_eq!(output.plain_text(), "");
        assert_eq!(output.get_successes().len(), 1);
    }

    #[test]
    fn test_debug_echoes_document() {
        let (fs, output, ctx) = setup();
        let target = Path::new("/out/homeserver.yaml");

        RenderConfigCommand::execute(&ctx, &paths(&["/conf/001.yaml"]), Some(target), true)
            .unwrap();

        assert_eq!(output.plain_text(), fs.get_file_contents(target).unwrap());
    }

    #[test]
    fn test_missing_variable_writes_nothing() {
        let fs = Arc::new(MockFileSystem::new().with_file("/conf/a.yaml", "key: ${UNSET}\n"));
        let output = Arc::new(MockOutput::new());
        let ctx = Context::test_with(
            fs.clone(),
            Arc::new(MockEnvironment::new()),
            output.clone(),
        );
        let target = Path::new("/out/config.yaml");

        let err =
            RenderConfigCommand::execute(&ctx, &paths(&["/conf/a.yaml"]), Some(target), false)
                .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<RenderError>(),
            Some(RenderError::MissingEnvironmentVariable(name)) if name == "UNSET"
        ));
        assert!(!fs.has_file(target));
        assert!(output.get_messages().is_empty());
    }

    #[test]
    fn test_missing_source_is_fatal() {
        let (_fs, _output, ctx) = setup();

        let err =
            RenderConfigCommand::execute(&ctx, &paths(&["/conf/nope.yaml"]), None, false)
                .unwrap_err();

        assert!(err.to_string().contains("/conf/nope.yaml"));
    }
}
