//! Form inputs and the prompt states shown before the pipeline can run.

/// Shown when no file has been uploaded yet.
pub const PROMPT_START: &str =
    "Por favor, ingresa el nombre del contribuyente y selecciona un archivo Excel para comenzar.";

/// Shown when a file was uploaded without a taxpayer name.
pub const PROMPT_TAXPAYER: &str = "Por favor, ingresa el nombre del contribuyente";

/// What the form host should do with the current inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState<'a> {
    /// No file yet.
    AwaitingInput,
    /// A file but no taxpayer name.
    MissingTaxpayer,
    /// Both inputs present; the pipeline can run.
    Ready { taxpayer: &'a str, file: &'a [u8] },
}

impl<'a> FormState<'a> {
    /// Classify the raw form inputs. Blank names and empty uploads count as
    /// absent.
    pub fn from_inputs(taxpayer: Option<&'a str>, file: Option<&'a [u8]>) -> Self {
        let taxpayer = taxpayer.map(str::trim).filter(|t| !t.is_empty());
        let file = file.filter(|f| !f.is_empty());

        match (taxpayer, file) {
            (Some(taxpayer), Some(file)) => FormState::Ready { taxpayer, file },
            (None, Some(_)) => FormState::MissingTaxpayer,
            (_, None) => FormState::AwaitingInput,
        }
    }

    /// Informational message for the non-ready states.
    pub fn prompt(&self) -> Option<&'static str> {
        match self {
            FormState::AwaitingInput => Some(PROMPT_START),
            FormState::MissingTaxpayer => Some(PROMPT_TAXPAYER),
            FormState::Ready { .. } => None,
        }
    }
}
