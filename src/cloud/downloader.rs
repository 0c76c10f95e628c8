//! Batch download of queried files to disk

use crate::cloud::naming::build_output_paths;
use crate::cloud::{CloudClient, CloudError, FileObject};
use crate::models::FileFormat;
use std::path::Path;
use tracing::{debug, error, info};

/// Where and how a batch of files is fetched and stored
pub struct DownloadTarget<'a> {
    pub base_url: &'a str,
    pub token: &'a str,
    pub subscription_key: &'a str,
    pub format: FileFormat,
    pub output_folder: &'a Path,
    pub prefix: &'a str,
}

/// Download every file and write it to all of its output paths.
///
/// A failed download or write is recorded and the batch continues. A folder
/// that cannot be created stops the batch; the errors collected so far are
/// returned.
pub async fn download_files<C>(
    client: &C,
    files: &[FileObject],
    target: &DownloadTarget<'_>,
) -> Vec<CloudError>
where
    C: CloudClient + ?Sized,
{
    let mut errors = Vec::new();

    for (index, file) in files.iter().enumerate() {
        debug!(
            "Processing file {}/{}: {} ({})",
            index + 1,
            files.len(),
            file.file_name,
            file.file_reference
        );

        let content = match client
            .download_file(
                &file.file_reference,
                target.base_url,
                target.token,
                target.subscription_key,
                target.format,
            )
            .await
        {
            Ok(content) => content,
            Err(e) => {
                error!(
                    "Failed in download of file with referenceId: {}, fileName: {}, format: {}, error: {}",
                    file.file_reference, file.file_name, target.format, e
                );
                errors.push(e);
                continue;
            }
        };

        for output_path in build_output_paths(file, target.prefix, target.output_folder, target.format) {
            if let Some(parent) = output_path.parent() {
                if let Err(e) = tokio::fs::create_dir_all(parent).await {
                    error!(
                        "Failed in creating folder for storage with path: {}, error: {}",
                        output_path.display(),
                        e
                    );
                    errors.push(CloudError::Persistence {
                        path: parent.to_path_buf(),
                        source: e,
                    });
                    return errors;
                }
            }

            match tokio::fs::write(&output_path, &content).await {
                Ok(()) => info!("✓ Wrote file to: {}", output_path.display()),
                Err(e) => {
                    error!(
                        "Failed in write of file with referenceId: {}, fileName: {}, outputLocation: {}, error: {}",
                        file.file_reference,
                        file.file_name,
                        output_path.display(),
                        e
                    );
                    errors.push(CloudError::Persistence {
                        path: output_path,
                        source: e,
                    });
                }
            }
        }
    }

    errors
}
