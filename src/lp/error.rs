use std::fmt;

use super::sets::Label;

fn write_key(f: &mut fmt::Formatter<'_>, key: &[Label]) -> fmt::Result {
    write!(f, "(")?;
    for (i, label) in key.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", label)?;
    }
    write!(f, ")")
}

/// A mistake in the declaration of sets, parameters or variables. These are
/// caller errors, raised at declaration time and never recovered from.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelDefinitionError {
    /// A label occurs more than once within a single index set.
    DuplicateLabel { set: String, label: Label },
    /// A label was looked up in a set that does not contain it.
    UnknownLabel { set: String, label: Label },
    /// A set was referenced by a name that was never defined.
    UnknownSet { name: String },
    /// A set that is already referenced by a parameter, variable block or
    /// equation family was redefined.
    SetAlreadyInUse { set: String },
    /// A parameter key tuple does not match the sets the parameter is
    /// dimensioned over.
    InvalidKey {
        parameter: String,
        key: Vec<Label>,
        detail: String,
    },
    /// A parameter value was read for a key tuple that was never set.
    /// Lookups do not fall back to zero.
    MissingValue { parameter: String, key: Vec<Label> },
    /// A parameter was referenced by a name that was never declared.
    UnknownParameter { name: String },
    /// A variable block was referenced by a name that was never declared.
    UnknownVariable { name: String },
    /// An indexed variable block was addressed without a label, or a scalar
    /// variable was addressed with one.
    VariableArity { variable: String, indexed: bool },
    /// A variable block was declared with lower bound above its upper bound.
    NonMonotonicBounds {
        variable: String,
        lower: f64,
        upper: f64,
    },
    /// A parameter, variable block or equation family name was declared twice.
    Redeclaration { kind: &'static str, name: String },
}

impl fmt::Display for ModelDefinitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelDefinitionError::DuplicateLabel { set, label } => {
                write!(f, "label `{}` occurs twice in set `{}`", label, set)
            }
            ModelDefinitionError::UnknownLabel { set, label } => {
                write!(f, "label `{}` is not a member of set `{}`", label, set)
            }
            ModelDefinitionError::UnknownSet { name } => {
                write!(f, "no set named `{}` has been defined", name)
            }
            ModelDefinitionError::SetAlreadyInUse { set } => {
                write!(f, "set `{}` is already referenced and can not be redefined", set)
            }
            ModelDefinitionError::InvalidKey {
                parameter,
                key,
                detail,
            } => {
                write!(f, "invalid key ")?;
                write_key(f, key)?;
                write!(f, " for parameter `{}`: {}", parameter, detail)
            }
            ModelDefinitionError::MissingValue { parameter, key } => {
                write!(f, "parameter `{}` has no value for key ", parameter)?;
                write_key(f, key)
            }
            ModelDefinitionError::UnknownParameter { name } => {
                write!(f, "no parameter named `{}` has been declared", name)
            }
            ModelDefinitionError::UnknownVariable { name } => {
                write!(f, "no variable block named `{}` has been declared", name)
            }
            ModelDefinitionError::VariableArity { variable, indexed } => {
                if *indexed {
                    write!(f, "variable block `{}` is indexed and must be addressed by label", variable)
                } else {
                    write!(f, "variable `{}` is scalar and takes no label", variable)
                }
            }
            ModelDefinitionError::NonMonotonicBounds {
                variable,
                lower,
                upper,
            } => {
                write!(
                    f,
                    "variable `{}` has lower bound {} above upper bound {}",
                    variable, lower, upper
                )
            }
            ModelDefinitionError::Redeclaration { kind, name } => {
                write!(f, "{} `{}` is already declared", kind, name)
            }
        }
    }
}

impl std::error::Error for ModelDefinitionError {}

/// A failure while expanding equation families or assembling the matrix.
/// Always fatal to the compilation attempt; no partial model is returned.
#[derive(Debug, Clone, PartialEq)]
pub enum CompilationError {
    /// An expression referenced a column outside the variable catalog.
    UnboundVariableReference { equation: String, column: usize },
    /// A compiled row ended up with no coefficients, which signals a
    /// modelling error rather than a legitimate constraint.
    EmptyExpression {
        equation: String,
        label: Option<Label>,
    },
    /// The assembled bound or name arrays disagree with the declared
    /// column/row counts.
    InconsistentDimensions {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    /// A declared variable appears in no row and not in the objective, and
    /// the compile options do not permit orphans.
    OrphanVariable { variable: String },
    /// The family flagged as defining the objective variable is missing,
    /// indexed, or not an equality.
    ObjectiveRowInvalid { equation: String },
    /// The model was compiled without an objective.
    MissingObjective,
}

impl fmt::Display for CompilationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompilationError::UnboundVariableReference { equation, column } => {
                write!(
                    f,
                    "equation `{}` references column {} which is not in the variable catalog",
                    equation, column
                )
            }
            CompilationError::EmptyExpression { equation, label } => {
                write!(f, "equation `{}`", equation)?;
                if let Some(label) = label {
                    write!(f, " at `{}`", label)?;
                }
                write!(f, " expanded to a row with no coefficients")
            }
            CompilationError::InconsistentDimensions {
                what,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "inconsistent dimensions for {}: expected {}, got {}",
                    what, expected, actual
                )
            }
            CompilationError::OrphanVariable { variable } => {
                write!(
                    f,
                    "variable `{}` appears in no row and not in the objective",
                    variable
                )
            }
            CompilationError::ObjectiveRowInvalid { equation } => {
                write!(
                    f,
                    "equation `{}` can not define the objective variable: it must be a scalar equality",
                    equation
                )
            }
            CompilationError::MissingObjective => {
                write!(f, "the model has no objective")
            }
        }
    }
}

impl std::error::Error for CompilationError {}

/// Any failure on the way from declarations to a canonical model.
#[derive(Debug, Clone, PartialEq, derive_more::From)]
pub enum Error {
    Definition(ModelDefinitionError),
    Compilation(CompilationError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Definition(e) => e.fmt(f),
            Error::Compilation(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Definition(e) => Some(e),
            Error::Compilation(e) => Some(e),
        }
    }
}
