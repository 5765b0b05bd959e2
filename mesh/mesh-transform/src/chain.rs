//! Ordered accumulator of named rigid transform stages.

use crate::error::{TransformError, TransformResult};
use crate::transform::RigidTransform;

/// A sequence of named rigid transforms applied in push order.
///
/// Alignment is a fixed sequence of rotation and translation stages; keeping
/// them named and ordered lets callers inspect each stage and compose any
/// prefix.
///
/// # Example
///
/// ```
/// use mesh_transform::{RigidTransform, TransformChain};
/// use nalgebra::{Point3, Vector3};
///
/// let mut chain = TransformChain::new();
/// chain.push("lift", RigidTransform::translation(Vector3::new(0.0, 0.0, 1.0)));
/// chain.push("shift", RigidTransform::translation(Vector3::new(2.0, 0.0, 0.0)));
///
/// let p = chain.compose().transform_point(&Point3::origin());
/// assert_eq!(p, Point3::new(2.0, 0.0, 1.0));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TransformChain {
    stages: Vec<(String, RigidTransform)>,
}

impl TransformChain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// True if no stage has been pushed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Appends a named stage; it is applied after every existing stage.
    pub fn push(&mut self, name: impl Into<String>, transform: RigidTransform) {
        self.stages.push((name.into(), transform));
    }

    /// Gets the first stage with the given name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RigidTransform> {
        self.stages
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t)
    }

    /// Stage names in application order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|(n, _)| n.as_str())
    }

    /// Composes every stage in order. An empty chain composes to identity.
    #[must_use]
    pub fn compose(&self) -> RigidTransform {
        self.stages
            .iter()
            .fold(RigidTransform::identity(), |acc, (_, t)| acc.then(t))
    }

    /// Composes stages up to and including the named stage.
    ///
    /// # Errors
    ///
    /// Returns `TransformError::UnknownStage` if no stage has that name.
    pub fn compose_to(&self, name: &str) -> TransformResult<RigidTransform> {
        let mut result = RigidTransform::identity();
        for (n, transform) in &self.stages {
            result = result.then(transform);
            if n == name {
                return Ok(result);
            }
        }
        Err(TransformError::UnknownStage {
            name: name.to_string(),
        })
    }
}
