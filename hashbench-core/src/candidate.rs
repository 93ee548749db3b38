//! Candidates and Suites
//!
//! A [`Candidate`] is a named function over the suite input. A [`Suite`] is the
//! ordered set of candidates benchmarked together against one input size.

use crate::error::SuiteError;
use std::fmt;
use std::hint::black_box;

/// Error raised by a candidate during one invocation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct CandidateError(String);

impl CandidateError {
    /// Create an error from any message
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// The error message
    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Type-erased candidate body
pub type InvokeFn = Box<dyn Fn(&[u8]) -> Result<(), CandidateError>>;

/// A named function under measurement. Immutable once built.
pub struct Candidate {
    name: String,
    invoke: InvokeFn,
}

impl Candidate {
    /// Wrap an infallible function. Input and output pass through
    /// `black_box` so the call cannot be optimised away.
    pub fn new<F, T>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[u8]) -> T + 'static,
    {
        Self {
            name: name.into(),
            invoke: Box::new(move |input: &[u8]| {
                black_box(f(black_box(input)));
                Ok(())
            }),
        }
    }

    /// Wrap a function that may fail; any `Err` aborts the measurement.
    pub fn fallible<F, T, E>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[u8]) -> Result<T, E> + 'static,
        E: fmt::Display,
    {
        Self {
            name: name.into(),
            invoke: Box::new(move |input: &[u8]| match f(black_box(input)) {
                Ok(value) => {
                    black_box(value);
                    Ok(())
                }
                Err(e) => Err(CandidateError::new(e.to_string())),
            }),
        }
    }

    /// Candidate name (unique within a suite)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the candidate once
    #[inline(always)]
    pub fn invoke(&self, input: &[u8]) -> Result<(), CandidateError> {
        (self.invoke)(input)
    }
}

impl fmt::Debug for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate").field("name", &self.name).finish()
    }
}

/// Candidates benchmarked against one fixed input size
#[derive(Debug)]
pub struct Suite {
    label: String,
    input_size_bytes: usize,
    candidates: Vec<Candidate>,
}

impl Suite {
    /// Create an empty suite
    pub fn new(label: impl Into<String>, input_size_bytes: usize) -> Self {
        Self {
            label: label.into(),
            input_size_bytes,
            candidates: Vec::new(),
        }
    }

    /// Create an empty suite labelled `"<size> bytes"`
    pub fn for_size(input_size_bytes: usize) -> Self {
        Self::new(format!("{} bytes", input_size_bytes), input_size_bytes)
    }

    /// Register an infallible candidate
    pub fn register<F, T>(&mut self, name: impl Into<String>, f: F) -> Result<&mut Self, SuiteError>
    where
        F: Fn(&[u8]) -> T + 'static,
    {
        self.add(Candidate::new(name, f))
    }

    /// Register a candidate whose errors abort its measurement
    pub fn register_fallible<F, T, E>(
        &mut self,
        name: impl Into<String>,
        f: F,
    ) -> Result<&mut Self, SuiteError>
    where
        F: Fn(&[u8]) -> Result<T, E> + 'static,
        E: fmt::Display,
    {
        self.add(Candidate::fallible(name, f))
    }

    /// Add a prebuilt candidate, rejecting duplicate names
    pub fn add(&mut self, candidate: Candidate) -> Result<&mut Self, SuiteError> {
        if self.contains(candidate.name()) {
            return Err(SuiteError::DuplicateCandidate(candidate.name.clone()));
        }
        self.candidates.push(candidate);
        Ok(self)
    }

    /// Whether a candidate with this name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.candidates.iter().any(|c| c.name() == name)
    }

    /// Suite label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Input size in bytes fed to every candidate
    pub fn input_size_bytes(&self) -> usize {
        self.input_size_bytes
    }

    /// Candidates in registration order
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Number of registered candidates
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether no candidate is registered
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Check the suite can be run
    pub fn validate(&self) -> Result<(), SuiteError> {
        if self.input_size_bytes == 0 {
            return Err(SuiteError::InvalidInputSize {
                label: self.label.clone(),
                size: self.input_size_bytes,
            });
        }
        if self.candidates.is_empty() {
            return Err(SuiteError::EmptySuite(self.label.clone()));
        }
        Ok(())
    }
}
