use crate::context::Context;
use crate::secrets::{self, KubernetesSecretStore, SecretLabels, SecretSpec, SecretStore};
use anyhow::{Context as AnyhowContext, Result};

/// Handles the 'generate-secrets' command - fills managed Kubernetes secrets
pub struct GenerateSecretsCommand;

impl GenerateSecretsCommand {
    /// Execute against the Kubernetes API (kubeconfig or in-cluster)
    pub fn execute(
        ctx: &Context,
        secrets: &str,
        labels: Option<&str>,
        namespace: Option<&str>,
    ) -> Result<()> {
        let specs = SecretSpec::parse_list(secrets)?;
        let labels = SecretLabels::parse(labels.unwrap_or_default())?;
        let namespace = Self::resolve_namespace(ctx, namespace)?;

        let store = KubernetesSecretStore::try_default()
            .context("Failed to configure the Kubernetes client")?;

        Self::run(ctx, &store, &specs, &labels, &namespace)
    }

    /// Reconcile already parsed specs against `store`
    pub fn run(
        ctx: &Context,
        store: &dyn SecretStore,
        specs: &[SecretSpec],
        labels: &SecretLabels,
        namespace: &str,
    ) -> Result<()> {
        ctx.output.key_value("Namespace", namespace);
        secrets::reconcile_all(store, labels, namespace, specs, &*ctx.output)?;
        ctx.output.success(&format!("Reconciled {} secret key(s)", specs.len()));
        Ok(())
    }

    /// `--namespace`, then `NAMESPACE`, then the service account namespace
    fn resolve_namespace(ctx: &Context, namespace: Option<&str>) -> Result<String> {
        let namespace = match namespace {
            Some(namespace) => Some(namespace.to_string()),
            None => ctx.env.var("NAMESPACE")?,
        };

        namespace
            .filter(|ns| !ns.is_empty())
            .or_else(|| KubernetesSecretStore::in_cluster_namespace(&*ctx.fs))
            .context("No namespace given: pass --namespace or set NAMESPACE")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::{InMemorySecretStore, MANAGED_BY_LABEL, SecretError};
    use crate::traits::{MockEnvironment, MockFileSystem, MockOutput, OutputMessage};
    use std::sync::Arc;

    fn context(env: MockEnvironment, fs: MockFileSystem) -> (Arc<MockOutput>, Context) {
        let output = Arc::new(MockOutput::new());
        let ctx = Context::test_with(Arc::new(fs), Arc::new(env), output.clone());
        (output, ctx)
    }

    #[test]
    fn test_run_generates_requested_keys() {
        let (output, ctx) = context(MockEnvironment::new(), MockFileSystem::new());
        let store = InMemorySecretStore::new();
        let specs =
            SecretSpec::parse_list("synapse:MACAROON:rand32,synapse:SIGNING:signingkey").unwrap();
        let labels = SecretLabels::parse("app.kubernetes.io/part-of=matrix-stack").unwrap();

        GenerateSecretsCommand::run(&ctx, &store, &specs, &labels, "matrix").unwrap();

        let record = store.record("matrix", "synapse").unwrap();
        assert_eq!(record.data.len(), 2);
        assert_eq!(record.labels.get(MANAGED_BY_LABEL).unwrap(), "matrix-tools-init-secrets");
        assert!(output.contains_message(&OutputMessage::KeyValue(
            "Namespace".to_string(),
            "matrix".to_string()
        )));
        assert_eq!(output.get_successes().last().unwrap(), "Reconciled 2 secret key(s)");
    }

    #[test]
    fn test_run_propagates_reconcile_failure() {
        let (output, ctx) = context(MockEnvironment::new(), MockFileSystem::new());
        let store = InMemorySecretStore::new();
        store.fail_on(crate::secrets::StoreOperation::Create);
        let specs = SecretSpec::parse_list("synapse:MACAROON:rand32").unwrap();

        let labels = SecretLabels::managed();
        let err = GenerateSecretsCommand::run(&ctx, &store, &specs, &labels, "matrix").unwrap_err();

        assert!(matches!(
            err.downcast_ref::<SecretError>(),
            Some(SecretError::Store { .. })
        ));
        assert!(output.get_successes().is_empty());
    }

    #[test]
    fn test_invalid_spec_fails_before_connecting() {
        let (_output, ctx) = context(MockEnvironment::new(), MockFileSystem::new());

        let err =
            GenerateSecretsCommand::execute(&ctx, "synapse:MACAROON", None, Some("matrix"))
                .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<SecretError>(),
            Some(SecretError::InvalidSecretSpec(arg)) if arg == "synapse:MACAROON"
        ));
    }

    #[test]
    fn test_invalid_label_is_rejected() {
        let (_output, ctx) = context(MockEnvironment::new(), MockFileSystem::new());

        let err =
            GenerateSecretsCommand::execute(&ctx, "s:k:rand32", Some("broken"), Some("matrix"))
                .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<SecretError>(),
            Some(SecretError::InvalidLabel(_))
        ));
    }

    #[test]
    fn test_namespace_resolution_order() {
        let fs = MockFileSystem::new().with_file(
            "/var/run/secrets/kubernetes.io/serviceaccount/namespace",
            "from-sa\n",
        );
        let (_output, ctx) = context(MockEnvironment::new().with_var("NAMESPACE", "from-env"), fs);

        assert_eq!(
            GenerateSecretsCommand::resolve_namespace(&ctx, Some("from-flag")).unwrap(),
            "from-flag"
        );
        assert_eq!(
            GenerateSecretsCommand::resolve_namespace(&ctx, None).unwrap(),
            "from-env"
        );

        let fs = MockFileSystem::new().with_file(
            "/var/run/secrets/kubernetes.io/serviceaccount/namespace",
            "from-sa\n",
        );
        let (_output, ctx) = context(MockEnvironment::new(), fs);
        assert_eq!(
            GenerateSecretsCommand::resolve_namespace(&ctx, None).unwrap(),
            "from-sa"
        );
    }

    #[test]
    fn test_non_unicode_namespace_is_rejected() {
        let env = MockEnvironment::new().with_non_unicode_var("NAMESPACE");
        let (_output, ctx) = context(env, MockFileSystem::new());

        let err = GenerateSecretsCommand::resolve_namespace(&ctx, None).unwrap_err();
        assert!(err.to_string().contains("NAMESPACE"));
    }

    #[test]
    fn test_namespace_required() {
        let (_output, ctx) = context(MockEnvironment::new(), MockFileSystem::new());
        assert!(GenerateSecretsCommand::resolve_namespace(&ctx, None).is_err());
    }
}
