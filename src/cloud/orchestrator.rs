//! End-to-end download runs driven by a `DownloadConfiguration`

use crate::cloud::downloader::{download_files, DownloadTarget};
use crate::cloud::query::{build_query, FileQuery};
use crate::cloud::window::{days_between, resolve_time_window_at, MAX_PERIOD_DAYS, MAX_ROLL_DAYS};
use crate::cloud::{CloudClient, CloudError, HttpCloudClient};
use crate::config::{ServiceEndpoints, Settings};
use crate::models::{DownloadConfiguration, FileFormat, ReportEntry, ReportKind, ROLL_DAYS_UNSET};
use chrono::{Local, NaiveDate};
use tracing::{debug, error, info, warn};

/// Check every configuration entry; the first violation is returned
pub fn validate_configuration(config: &DownloadConfiguration) -> Result<(), CloudError> {
    for (kind, entry) in config.entries() {
        validate_entry(kind, entry)?;
    }
    Ok(())
}

fn validate_entry(kind: ReportKind, entry: &ReportEntry) -> Result<(), CloudError> {
    if let Some(roll_days) = entry.roll_days {
        if roll_days > MAX_ROLL_DAYS || (roll_days < 0 && roll_days != ROLL_DAYS_UNSET) {
            return Err(CloudError::config(format!(
                "Invalid number of roll days specified: {}, allowed: 0 - {}",
                roll_days, MAX_ROLL_DAYS
            )));
        }
    }

    if !entry.date_from.is_empty() && !entry.date_to.is_empty() {
        let days = days_between(&entry.date_from, &entry.date_to)?;
        if days > MAX_PERIOD_DAYS {
            return Err(CloudError::config(format!(
                "Max number of days for a given period exceeded: {}, max set to: {}",
                days, MAX_PERIOD_DAYS
            )));
        }
    }

    let format = entry.format().map_err(|e| {
        CloudError::config(format!("{} entry: {}", kind_name(kind), e))
    })?;
    if kind.is_monthly() && format == FileFormat::Pdf {
        return Err(CloudError::config(format!(
            "Unsupported format specified for {} data, pdf not supported",
            kind_name(kind)
        )));
    }

    Ok(())
}

/// Expand the configuration into file queries.
///
/// Production entries yield a DPR10 and a DPR20 query. Monthly entries asking
/// for PDF are rejected with an error and left out; the rest are still built.
pub fn build_queries(
    config: &DownloadConfiguration,
    today: NaiveDate,
) -> (Vec<FileQuery>, Vec<CloudError>) {
    let mut queries = Vec::new();
    let mut errors = Vec::new();

    debug!("Processing production entries: {}", config.production.len());
    for entry in &config.production {
        for kind in [ReportKind::Dpr10, ReportKind::Dpr20] {
            match create_query(entry, kind, today) {
                Ok(query) => queries.push(query),
                Err(e) => errors.push(e),
            }
        }
    }

    let monthly = config
        .monthly_government
        .iter()
        .map(|e| (ReportKind::MprmlGov, e))
        .chain(config.monthly_partner.iter().map(|e| (ReportKind::MprmlPartner, e)));
    for (kind, entry) in monthly {
        match create_query(entry, kind, today) {
            Ok(query) if query.format == FileFormat::Pdf => {
                warn!("PDFs are not supported for {} reports, skipping entry", kind_name(kind));
                errors.push(CloudError::UnsupportedFormat {
                    report: kind_name(kind).to_string(),
                    format: query.format.to_string(),
                });
            }
            Ok(query) => queries.push(query),
            Err(e) => errors.push(e),
        }
    }

    debug!("Processing drilling entries: {}", config.drilling.len());
    for entry in &config.drilling {
        match create_query(entry, ReportKind::Ddrml, today) {
            Ok(query) => queries.push(query),
            Err(e) => errors.push(e),
        }
    }

    (queries, errors)
}

fn create_query(entry: &ReportEntry, kind: ReportKind, today: NaiveDate) -> Result<FileQuery, CloudError> {
    let format = entry.format().map_err(|e| {
        warn!("{} entry: {}", kind_name(kind), e);
        CloudError::UnsupportedFormat {
            report: kind_name(kind).to_string(),
            format: entry.common.format.clone(),
        }
    })?;

    let field = match kind {
        ReportKind::Ddrml => None,
        _ => entry.field_name.clone().filter(|f| !f.trim().is_empty()),
    };

    Ok(FileQuery {
        window: resolve_time_window_at(today, entry.roll_days, &entry.date_from, &entry.date_to),
        field,
        report_kind: kind,
        format,
        use_uploaded_from: entry.use_uploaded_from,
        output_folder: entry.common.output_folder.clone(),
        output_prefix: entry.common.file_output_prefix.clone(),
    })
}

fn kind_name(kind: ReportKind) -> &'static str {
    match kind {
        ReportKind::Dpr10 | ReportKind::Dpr20 => "DPR",
        ReportKind::Ddrml => "DDRML",
        ReportKind::MprmlGov => "MPRML Government",
        ReportKind::MprmlPartner => "MPRML Partner",
    }
}

/// Coordinates validation, authentication, querying and downloading
pub struct DownloadOrchestrator<C> {
    client: C,
    settings: Settings,
}

impl DownloadOrchestrator<HttpCloudClient> {
    /// Orchestrator talking to the real services
    pub fn from_settings(settings: Settings) -> Result<Self, CloudError> {
        let client = HttpCloudClient::new(&settings)?;
        Ok(Self::new(client, settings))
    }
}

impl<C: CloudClient> DownloadOrchestrator<C> {
    pub fn new(client: C, settings: Settings) -> Self {
        Self { client, settings }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Run every configured query and download the matched files.
    ///
    /// Returns every error met on the way; an empty list means full success.
    pub async fn process_and_run_download(&self, config: &DownloadConfiguration) -> Vec<CloudError> {
        self.process_and_run_download_at(config, Local::now().date_naive())
            .await
    }

    pub async fn process_and_run_download_at(
        &self,
        config: &DownloadConfiguration,
        today: NaiveDate,
    ) -> Vec<CloudError> {
        if let Err(e) = validate_configuration(config) {
            error!("Invalid download configuration: {}", e);
            return vec![e];
        }

        let token = match self.client.authenticate().await {
            Ok(token) => token,
            Err(e) => {
                error!("Failed in getting token: {}", e);
                return vec![e];
            }
        };
        debug!("Got token");

        let endpoints = match self.settings.service_endpoints() {
            Ok(endpoints) => endpoints,
            Err(e) => {
                error!("{}", e);
                return vec![e];
            }
        };

        let (queries, mut errors) = build_queries(config, today);
        info!("Running {} file queries", queries.len());

        for (index, query) in queries.iter().enumerate() {
            info!(
                "Running file query {}/{} for field: {}, fileType: {}, reportType: {}, timeRange: {} - {}, useUploadedFrom: {}",
                index + 1,
                queries.len(),
                query.field.as_deref().unwrap_or("-"),
                query.query_file_type().query_value(),
                query.report_kind,
                query.window.from,
                query.window.to,
                query.use_uploaded_from
            );
            errors.extend(self.run_query_and_download_files(query, &token, &endpoints).await);
        }

        if errors.is_empty() {
            info!("Download run completed without errors");
        } else {
            warn!("Download run completed with {} errors", errors.len());
        }
        errors
    }

    /// Query for one `FileQuery` and download what it matched
    async fn run_query_and_download_files(
        &self,
        query: &FileQuery,
        token: &str,
        endpoints: &ServiceEndpoints,
    ) -> Vec<CloudError> {
        let document = build_query(query, query.variant());

        let data = match self
            .client
            .run_query(token, &endpoints.graph_url, &endpoints.subscription_key, &document)
            .await
        {
            Ok(data) => data,
            Err(e) => {
                error!("Metadata query for files failed: {}", e);
                return vec![e];
            }
        };
        info!("Got number of files: {}", data.files.len());

        let mut errors = Vec::new();
        if !data.errors.is_empty() {
            errors.push(CloudError::Query {
                messages: data.errors.iter().map(|e| e.message.clone()).collect(),
            });
        }

        let target = DownloadTarget {
            base_url: &endpoints.file_download_url,
            token,
            subscription_key: &endpoints.subscription_key,
            format: query.format,
            output_folder: &query.output_folder,
            prefix: &query.output_prefix,
        };
        let download_errors = download_files(&self.client, &data.files, &target).await;
        if !download_errors.is_empty() {
            error!(
                "Failed in download of {} cloud files for {}, please check logs",
                download_errors.len(),
                query.report_kind
            );
        }
        errors.extend(download_errors);
        errors
    }
}
