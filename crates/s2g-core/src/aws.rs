//! Shared AWS SDK configuration.

use tracing::debug;

/// Build an AWS SDK configuration with credentials.
///
/// Uses explicit credentials when both halves are configured, otherwise the
/// default credential chain (env vars, profile, IAM role).
pub async fn sdk_config(
    region: Option<&str>,
    access_key_id: Option<&str>,
    secret_access_key: Option<&str>,
) -> aws_config::SdkConfig {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

    if let Some(region) = region {
        loader = loader.region(aws_config::Region::new(region.to_string()));
    }

    if let (Some(access_key), Some(secret_key)) = (access_key_id, secret_access_key) {
        debug!("Using explicit AWS credentials");
        let credentials = aws_credential_types::Credentials::new(
            access_key,
            secret_key,
            None, // session token
            None, // expiry
            "s2g-explicit-credentials",
        );
        loader = loader.credentials_provider(credentials);
    } else {
        debug!("Using default AWS credential chain");
    }

    loader.load().await
}
