use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tracing::{debug, instrument};

use crate::models::{Service, Services};

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("cannot read file `{0}': {1}")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("cannot read yaml file: {0}")]
    Decode(#[from] serde_yaml::Error),

    #[error("service names cannot be empty")]
    EmptyName,
}

/// Read the desired services from the manifest at `path`
#[instrument(name = "load_manifest", skip_all, fields(path = %path.as_ref().display()), err)]
pub async fn load(path: impl AsRef<Path>) -> Result<Services, ManifestError> {
    let path = path.as_ref();
    let data = fs::read_to_string(path)
        .await
        .map_err(|e| ManifestError::Read(path.to_path_buf(), e))?;

    let services = parse(&data)?;
    debug!("found {} services", services.len());

    Ok(services)
}

/// Decode a manifest document.
///
/// The document maps service names to their configuration, the name is
/// copied into each service.
pub fn parse(data: &str) -> Result<Services, ManifestError> {
    let services: Services = serde_yaml::from_str(data)?;

    services
        .into_iter()
        .map(|(name, service)| {
            if name.is_empty() {
                return Err(ManifestError::EmptyName);
            }
            let service = Service {
                name: name.clone(),
                ..service
            };
            Ok((name, service))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_parses_a_manifest() {
        let services = parse(
            r#"
web:
  image: nginx
  command: nginx -g "daemon off;"
  ports:
    - "8080:80"
    - "127.0.0.1:8443:443"
  volumes:
    - /srv/www:/usr/share/nginx/html
db:
  image: postgres:16
"#,
        )
        .unwrap();

        assert_eq!(services.len(), 2);
        assert_eq!(
            services["web"],
            Service {
                id: String::new(),
                name: "web".to_string(),
                image: "nginx".to_string(),
                command: "nginx -g \"daemon off;\"".to_string(),
                ports: vec!["8080:80".to_string(), "127.0.0.1:8443:443".to_string()],
                volumes: vec!["/srv/www:/usr/share/nginx/html".to_string()],
            }
        );
        assert_eq!(
            services["db"],
            Service {
                name: "db".to_string(),
                image: "postgres:16".to_string(),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_ignores_unknown_keys() {
        let services = parse(
            r#"
web:
  image: nginx
  environment:
    FOO: bar
"#,
        )
        .unwrap();
        assert_eq!(services["web"].image, "nginx");
    }

    #[test]
    fn test_requires_an_image() {
        let res = parse("web:\n  command: sleep 10\n");
        assert!(matches!(res, Err(ManifestError::Decode(_))));
    }

    #[test]
    fn test_rejects_documents_that_are_not_a_mapping() {
        let res = parse("- web\n- db\n");
        assert!(matches!(res, Err(ManifestError::Decode(_))));
    }

    #[test]
    fn test_rejects_empty_service_names() {
        let res = parse("'':\n  image: nginx\n");
        assert!(matches!(res, Err(ManifestError::EmptyName)));
    }

    #[tokio::test]
    async fn test_loads_a_manifest_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fig.yml");
        std::fs::write(&path, "web:\n  image: nginx\n").unwrap();

        let services = load(&path).await.unwrap();
        assert_eq!(services["web"].name, "web");
    }

    #[tokio::test]
    async fn test_fails_on_a_missing_file() {
        let dir = tempdir().unwrap();
        let res = load(dir.path().join("missing.yml")).await;
        assert!(matches!(res, Err(ManifestError::Read(..))));
    }
}
