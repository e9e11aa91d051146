//! Verification and validation campaigns over solver case studies.

pub mod campaign;
pub mod error;
pub mod mail;
pub mod params;
pub mod report;
pub mod tools;

pub use campaign::{CampaignOptions, CampaignOutcome, Phase, mail_subject, run_campaign};
pub use error::{Result, VnvError};
pub use mail::{
    MailDelivery, MailError, MailMessage, MailSettings, MailTransport, SmtpTransport, send_report,
};
pub use params::Parameters;
pub use report::{CaseRecord, ReportLog, StepStatus};
pub use tools::{Invocation, ProcessRunner, ToolOutcome, ToolRunner, Tools};
