use mosaic_core_types::PassId;
use thiserror::Error;

/// Result type alias using MosaicError
pub type Result<T> = std::result::Result<T, MosaicError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// This taxonomy provides a stable, structured classification of all errors
/// raised by the engine. Each kind maps to a stable error code that can be
/// used for programmatic error handling, testing, and log assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Inclusion
    CyclicInclusion,
    MissingRequiredAttribute,
    InvalidRepeatValue,
    InvalidInitialState,
    PassLimitExceeded,

    // Fragment validation
    MissingBehaviorSection,
    MissingMarkupSection,
    TooManyStyleSections,
    TooManyTestSections,

    // Registries
    AlreadyRegistered,
    NotRegistered,
    FragmentNotRegistered,
    UnknownBehaviorClass,
    UnknownField,

    // Lifecycle
    MarkerMissing,
    AlreadyMounted,
    NotMounted,
    StillMounted,
    NoEventBinding,

    // Integration/IO
    FetchFailure,
    Parse,
    Config,
    Io,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::CyclicInclusion => "ERR_CYCLIC_INCLUSION",
            ExErrorKind::MissingRequiredAttribute => "ERR_MISSING_REQUIRED_ATTRIBUTE",
            ExErrorKind::InvalidRepeatValue => "ERR_INVALID_REPEAT_VALUE",
            ExErrorKind::InvalidInitialState => "ERR_INVALID_INITIAL_STATE",
            ExErrorKind::PassLimitExceeded => "ERR_PASS_LIMIT_EXCEEDED",
            ExErrorKind::MissingBehaviorSection => "ERR_MISSING_BEHAVIOR_SECTION",
            ExErrorKind::MissingMarkupSection => "ERR_MISSING_MARKUP_SECTION",
            ExErrorKind::TooManyStyleSections => "ERR_TOO_MANY_STYLE_SECTIONS",
            ExErrorKind::TooManyTestSections => "ERR_TOO_MANY_TEST_SECTIONS",
            ExErrorKind::AlreadyRegistered => "ERR_ALREADY_REGISTERED",
            ExErrorKind::NotRegistered => "ERR_NOT_REGISTERED",
            ExErrorKind::FragmentNotRegistered => "ERR_FRAGMENT_NOT_REGISTERED",
            ExErrorKind::UnknownBehaviorClass => "ERR_UNKNOWN_BEHAVIOR_CLASS",
            ExErrorKind::UnknownField => "ERR_UNKNOWN_FIELD",
            ExErrorKind::MarkerMissing => "ERR_MARKER_MISSING",
            ExErrorKind::AlreadyMounted => "ERR_ALREADY_MOUNTED",
            ExErrorKind::NotMounted => "ERR_NOT_MOUNTED",
            ExErrorKind::StillMounted => "ERR_STILL_MOUNTED",
            ExErrorKind::NoEventBinding => "ERR_NO_EVENT_BINDING",
            ExErrorKind::FetchFailure => "ERR_FETCH_FAILURE",
            ExErrorKind::Parse => "ERR_PARSE",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries the classification used for programmatic handling together with
/// the authoring context needed to locate the offending include tag.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    src: Option<String>,
    include_in: Option<String>,
    pass_id: Option<PassId>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            src: None,
            include_in: None,
            pass_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity context (class name, instance id or field)
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add the `src` of the include tag involved
    pub fn with_src(mut self, src: impl Into<String>) -> Self {
        self.src = Some(src.into());
        self
    }

    /// Add the including document name
    pub fn with_include_in(mut self, include_in: impl Into<String>) -> Self {
        self.include_in = Some(include_in.into());
        self
    }

    /// Add resolution pass context
    pub fn with_pass_id(mut self, pass_id: PassId) -> Self {
        self.pass_id = Some(pass_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the entity context, if any
    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    /// Get the include tag `src`, if any
    pub fn src(&self) -> Option<&str> {
        self.src.as_deref()
    }

    /// Get the including document name, if any
    pub fn include_in(&self) -> Option<&str> {
        self.include_in.as_deref()
    }

    /// Get the resolution pass, if any
    pub fn pass_id(&self) -> Option<&PassId> {
        self.pass_id.as_ref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        if let Some(include_in) = &self.include_in {
            write!(f, " (include_in: {})", include_in)?;
        }
        if let Some(src) = &self.src {
            write!(f, " (src: {})", src)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Error taxonomy for engine operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MosaicError {
    // ===== Inclusion Errors =====
    /// Including `src` from `include_in` would make a document its own ancestor
    #[error("Include tag causes infinite recursion: {include_in} includes {src}")]
    CyclicInclusion { include_in: String, src: String },

    /// Include tag lacks a required attribute
    #[error("Include tag missing required attribute '{attribute}' (include-in: {include_in}, src: {src})")]
    MissingRequiredAttribute {
        attribute: String,
        include_in: String,
        src: String,
    },

    /// `repeat` is not a positive integer
    #[error("Include tag 'repeat' attribute must be a positive integer, got '{value}' (include-in: {include_in}, src: {src})")]
    InvalidRepeatValue {
        value: String,
        include_in: String,
        src: String,
    },

    /// Initial props/vars are not a JSON object
    #[error("Initial {section} for include of {src} is not a JSON object: {reason}")]
    InvalidInitialState {
        section: String,
        src: String,
        reason: String,
    },

    /// Resolution did not settle within the configured number of passes
    #[error("Include resolution did not settle after {max_passes} passes")]
    PassLimitExceeded { max_passes: usize },

    // ===== Fragment Validation Errors =====
    /// Fragment must hold exactly one behavior script
    #[error("Fragment {class_name} must contain one and only one behavior script, found {found}")]
    MissingBehaviorSection { class_name: String, found: usize },

    /// Fragment must hold exactly one markup section
    #[error("Fragment {class_name} must contain one and only one markup section, found {found}")]
    MissingMarkupSection { class_name: String, found: usize },

    /// Fragment may hold at most one style section
    #[error("Fragment {class_name} can contain no more than one style section, found {found}")]
    TooManyStyleSections { class_name: String, found: usize },

    /// Fragment may hold at most one test section when tests are requested
    #[error("Fragment {class_name} can contain no more than one test section, found {found}")]
    TooManyTestSections { class_name: String, found: usize },

    // ===== Registry Errors =====
    /// Fragment class is already in the fragment registry
    #[error("Fragment {class_name} is already registered")]
    FragmentAlreadyRegistered { class_name: String },

    /// Fragment class is not in the fragment registry (unregistration)
    #[error("Fragment {class_name} was not in the registry")]
    FragmentNotInRegistry { class_name: String },

    /// An instance refers to a fragment class that is not registered
    #[error("Fragment {class_name} is not registered (instance: {instance_id})")]
    FragmentNotRegistered {
        class_name: String,
        instance_id: String,
    },

    /// Instance id is already in the component registry
    #[error("Component instance {instance_id} is already registered")]
    InstanceAlreadyRegistered { instance_id: String },

    /// Instance id is not in the component registry
    #[error("Component instance {instance_id} is not registered")]
    InstanceNotRegistered { instance_id: String },

    /// No behavior factory exists for the class name
    #[error("No behavior registered for class {class_name}")]
    UnknownBehaviorClass { class_name: String },

    /// Instance has no prop or var with this name
    #[error("Component instance {instance_id} has no field '{field}'")]
    UnknownField { instance_id: String, field: String },

    // ===== Lifecycle Errors =====
    /// The instance marker is not attached to the host tree
    #[error("Marker for component instance {instance_id} is not in the host tree")]
    MarkerMissing { instance_id: String },

    /// Instance is mounted already
    #[error("Component instance {instance_id} is already mounted")]
    AlreadyMounted { instance_id: String },

    /// Instance is not mounted
    #[error("Component instance {instance_id} is not mounted")]
    NotMounted { instance_id: String },

    /// Instance must be unmounted before it can be unregistered
    #[error("Component instance {instance_id} is still mounted")]
    StillMounted { instance_id: String },

    /// No event binding for the node/event pair
    #[error("No event binding for '{event}' on node {node}")]
    NoEventBinding { node: usize, event: String },

    // ===== Integration Errors =====
    /// External fetch of fragment text failed
    #[error("Failed to load {src}: {reason}")]
    FetchFailure { src: String, reason: String },

    /// Markup or state could not be parsed
    #[error("Parse error: {reason}")]
    Parse { reason: String },

    /// Engine configuration is invalid
    #[error("Configuration error: {reason}")]
    Config { reason: String },

    /// File system error
    #[error("IO error on {path}: {reason}")]
    Io { path: String, reason: String },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Conversion from MosaicError to ExError
impl From<MosaicError> for ExError {
    fn from(err: MosaicError) -> Self {
        let message = err.to_string();
        match err {
            MosaicError::CyclicInclusion { include_in, src } => {
                ExError::new(ExErrorKind::CyclicInclusion)
                    .with_include_in(include_in)
                    .with_src(src)
                    .with_message(message)
            }
            MosaicError::MissingRequiredAttribute {
                attribute,
                include_in,
                src,
            } => ExError::new(ExErrorKind::MissingRequiredAttribute)
                .with_entity_id(attribute)
                .with_include_in(include_in)
                .with_src(src)
                .with_message(message),
            MosaicError::InvalidRepeatValue {
                include_in, src, ..
            } => ExError::new(ExErrorKind::InvalidRepeatValue)
                .with_include_in(include_in)
                .with_src(src)
                .with_message(message),
            MosaicError::InvalidInitialState { src, .. } => {
                ExError::new(ExErrorKind::InvalidInitialState)
                    .with_src(src)
                    .with_message(message)
            }
            MosaicError::PassLimitExceeded { .. } => {
                ExError::new(ExErrorKind::PassLimitExceeded).with_message(message)
            }
            MosaicError::MissingBehaviorSection { class_name, .. } => {
                ExError::new(ExErrorKind::MissingBehaviorSection)
                    .with_entity_id(class_name)
                    .with_message(message)
            }
            MosaicError::MissingMarkupSection { class_name, .. } => {
                ExError::new(ExErrorKind::MissingMarkupSection)
                    .with_entity_id(class_name)
                    .with_message(message)
            }
            MosaicError::TooManyStyleSections { class_name, .. } => {
                ExError::new(ExErrorKind::TooManyStyleSections)
                    .with_entity_id(class_name)
                    .with_message(message)
            }
            MosaicError::TooManyTestSections { class_name, .. } => {
                ExError::new(ExErrorKind::TooManyTestSections)
                    .with_entity_id(class_name)
                    .with_message(message)
            }
            MosaicError::FragmentAlreadyRegistered { class_name } => {
                ExError::new(ExErrorKind::AlreadyRegistered)
                    .with_entity_id(class_name)
                    .with_message(message)
            }
            MosaicError::FragmentNotInRegistry { class_name } => {
                ExError::new(ExErrorKind::NotRegistered)
                    .with_entity_id(class_name)
                    .with_message(message)
            }
            MosaicError::FragmentNotRegistered { class_name, .. } => {
                ExError::new(ExErrorKind::FragmentNotRegistered)
                    .with_entity_id(class_name)
                    .with_message(message)
            }
            MosaicError::InstanceAlreadyRegistered { instance_id } => {
                ExError::new(ExErrorKind::AlreadyRegistered)
                    .with_entity_id(instance_id)
                    .with_message(message)
            }
            MosaicError::InstanceNotRegistered { instance_id } => {
                ExError::new(ExErrorKind::NotRegistered)
                    .with_entity_id(instance_id)
                    .with_message(message)
            }
            MosaicError::UnknownBehaviorClass { class_name } => {
                ExError::new(ExErrorKind::UnknownBehaviorClass)
                    .with_entity_id(class_name)
                    .with_message(message)
            }
            MosaicError::UnknownField { instance_id, .. } => {
                ExError::new(ExErrorKind::UnknownField)
                    .with_entity_id(instance_id)
                    .with_message(message)
            }
            MosaicError::MarkerMissing { instance_id } => ExError::new(ExErrorKind::MarkerMissing)
                .with_entity_id(instance_id)
                .with_message(message),
            MosaicError::AlreadyMounted { instance_id } => {
                ExError::new(ExErrorKind::AlreadyMounted)
                    .with_entity_id(instance_id)
                    .with_message(message)
            }
            MosaicError::NotMounted { instance_id } => ExError::new(ExErrorKind::NotMounted)
                .with_entity_id(instance_id)
                .with_message(message),
            MosaicError::StillMounted { instance_id } => ExError::new(ExErrorKind::StillMounted)
                .with_entity_id(instance_id)
                .with_message(message),
            MosaicError::NoEventBinding { .. } => {
                ExError::new(ExErrorKind::NoEventBinding).with_message(message)
            }
            MosaicError::FetchFailure { src, .. } => ExError::new(ExErrorKind::FetchFailure)
                .with_src(src)
                .with_message(message),
            MosaicError::Parse { .. } => ExError::new(ExErrorKind::Parse).with_message(message),
            MosaicError::Config { .. } => ExError::new(ExErrorKind::Config).with_message(message),
            MosaicError::Io { path, .. } => ExError::new(ExErrorKind::Io)
                .with_entity_id(path)
                .with_message(message),
            MosaicError::Internal { .. } => {
                ExError::new(ExErrorKind::Internal).with_message(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cyclic_inclusion_carries_context() {
        let err = MosaicError::CyclicInclusion {
            include_in: "a.html".to_string(),
            src: "b.html".to_string(),
        };

        let ex: ExError = err.into();

        assert_eq!(ex.kind(), ExErrorKind::CyclicInclusion);
        assert_eq!(ex.code(), "ERR_CYCLIC_INCLUSION");
        assert_eq!(ex.include_in(), Some("a.html"));
        assert_eq!(ex.src(), Some("b.html"));
    }

    #[test]
    fn test_fragment_and_instance_registry_errors_share_kinds() {
        let fragment: ExError = MosaicError::FragmentAlreadyRegistered {
            class_name: "Button".to_string(),
        }
        .into();
        let instance: ExError = MosaicError::InstanceAlreadyRegistered {
            instance_id: "Button1".to_string(),
        }
        .into();

        assert_eq!(fragment.kind(), ExErrorKind::AlreadyRegistered);
        assert_eq!(instance.kind(), ExErrorKind::AlreadyRegistered);
        assert_eq!(fragment.entity_id(), Some("Button"));
        assert_eq!(instance.entity_id(), Some("Button1"));
    }

    #[test]
    fn test_not_registered_distinct_from_fragment_not_registered() {
        let unregister: ExError = MosaicError::FragmentNotInRegistry {
            class_name: "Card".to_string(),
        }
        .into();
        let create: ExError = MosaicError::FragmentNotRegistered {
            class_name: "Card".to_string(),
            instance_id: "Card1".to_string(),
        }
        .into();

        assert_eq!(unregister.kind(), ExErrorKind::NotRegistered);
        assert_eq!(create.kind(), ExErrorKind::FragmentNotRegistered);
        assert_ne!(unregister.code(), create.code());
    }

    #[test]
    fn test_display_includes_code_and_message() {
        let ex = ExError::new(ExErrorKind::MarkerMissing)
            .with_op("mount")
            .with_entity_id("Counter1")
            .with_message("marker gone");

        let rendered = ex.to_string();
        assert!(rendered.starts_with("[ERR_MARKER_MISSING]"));
        assert!(rendered.contains("mount"));
        assert!(rendered.contains("Counter1"));
    }
}
