//! Stakeholder drill-down: workflow sections, step selection and memoized pain-point analysis.

mod cache;
mod evidence;
mod selection;
mod session;
mod source;

pub use cache::{CacheKey, PainPointCache};
pub use evidence::{Platform, format_mention_date};
pub use selection::{
	Navigator, NodeSelection, SectionStatus, StepRef, WorkflowOutcome, WorkflowSection,
	WorkflowStep, WorkflowTicket,
};
pub use session::{AnalysisOutcome, Explorer};
pub use source::{
	DetailSource, GraphSource, PainPoint, PainPointAnalysis, PainPointRequest, RawWorkflowStep,
	SourceMention, WorkflowRequest, parse_pain_points, parse_workflow,
};
