//! Function set available to placeholder values.
//!
//! Values are handlebars templates evaluated against the configuration merged so far.
//! Helpers: `readfile`, `hostname`, `replace` and `quote`; nesting goes through
//! sub-expressions, e.g. `{{replace "-main" "" (hostname)}}`.

use crate::traits::{Environment, FileSystem};
use handlebars::{
    Context, Handlebars, Helper, HelperDef, RenderContext, RenderError, RenderErrorReason,
    ScopedJson,
};
use serde_json::Value as JsonValue;
use std::path::Path;
use std::sync::Arc;

/// Handlebars registry with the placeholder function set registered
pub struct TemplateFunctions {
    handlebars: Handlebars<'static>,
}

impl TemplateFunctions {
    pub fn new(fs: Arc<dyn FileSystem>, env: Arc<dyn Environment>) -> Self {
        let mut handlebars = Handlebars::new();

        // Rendered values land in YAML, not HTML
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.set_strict_mode(true);

        handlebars.register_helper("readfile", Box::new(ReadFileHelper { fs }));
        handlebars.register_helper("hostname", Box::new(HostnameHelper { env }));
        handlebars.register_helper("replace", Box::new(ReplaceHelper));
        handlebars.register_helper("quote", Box::new(QuoteHelper));

        Self { handlebars }
    }

    /// Evaluate `template` with `data` as the root context
    pub fn evaluate(&self, template: &str, data: &JsonValue) -> Result<String, RenderError> {
        self.handlebars.render_template(template, data)
    }
}

fn str_param<'a>(
    h: &'a Helper<'_>,
    helper: &'static str,
    index: usize,
) -> Result<&'a str, RenderError> {
    let param = h
        .param(index)
        .ok_or(RenderErrorReason::ParamNotFoundForIndex(helper, index))?;

    param
        .value()
        .as_str()
        .ok_or_else(|| RenderErrorReason::InvalidParamType("string").into())
}

/// `readfile path`: file contents, byte for byte
struct ReadFileHelper {
    fs: Arc<dyn FileSystem>,
}

impl HelperDef for ReadFileHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        let path = str_param(h, "readfile", 0)?;
        let contents = self
            .fs
            .read_to_string(Path::new(path))
            .map_err(|e| RenderErrorReason::Other(format!("readfile: {:#}", e)))?;

        Ok(ScopedJson::Derived(JsonValue::String(contents)))
    }
}

/// `hostname`: the local machine's hostname
struct HostnameHelper {
    env: Arc<dyn Environment>,
}

impl HelperDef for HostnameHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        _: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        let hostname = self
            .env
            .hostname()
            .map_err(|e| RenderErrorReason::Other(format!("hostname: {:#}", e)))?;

        Ok(ScopedJson::Derived(JsonValue::String(hostname)))
    }
}

/// `replace old new s`: literal replacement of every occurrence
struct ReplaceHelper;

impl HelperDef for ReplaceHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        let old = str_param(h, "replace", 0)?;
        let new = str_param(h, "replace", 1)?;
        let s = str_param(h, "replace", 2)?;

        Ok(ScopedJson::Derived(JsonValue::String(s.replace(old, new))))
    }
}

/// `quote v`: double-quoted scalar, safe to embed in YAML
struct QuoteHelper;

impl HelperDef for QuoteHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        let value = h
            .param(0)
            .ok_or(RenderErrorReason::ParamNotFoundForIndex("quote", 0))?
            .value();

        let text = match value {
            JsonValue::String(s) => s.clone(),
            JsonValue::Null => String::new(),
            other => other.to_string(),
        };

        Ok(ScopedJson::Derived(JsonValue::String(
            JsonValue::String(text).to_string(),
        )))
    }
}
