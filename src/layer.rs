//! Binary layer configuration.
//!
//! A layer carries its operator tag, the position of an optional stored
//! constant operand, and the constant itself. Hosts build one per graph node
//! and hand it to [`crate::ops::dispatch::execute`] on every invocation.

use briny::prelude::*;

use crate::ops::binary::OpType;
use crate::tensors::{count, Operand};

/// Operator and operand-order parameters of a binary layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryParam {
    pub op: OpType,
    /// Where the stored constant goes when the layer has one tensor input:
    /// `0` puts it first, `1` puts it second.
    pub weight_input_index: usize,
}

impl BinaryParam {
    #[must_use]
    pub const fn new(op: OpType) -> Self {
        Self {
            op,
            weight_input_index: 1,
        }
    }

    #[must_use]
    pub const fn with_weight_index(mut self, index: usize) -> Self {
        self.weight_input_index = index;
        self
    }
}

impl Validate for BinaryParam {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.weight_input_index > 1 {
            return Err(ValidationError);
        }
        Ok(())
    }
}

/// A constant operand stored with the layer (bias, scale, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct ElementResource {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

impl ElementResource {
    /// # Panics
    /// Panics if `data.len()` does not match the shape.
    pub fn new(shape: impl Into<Vec<usize>>, data: Vec<f32>) -> Self {
        let shape = shape.into();
        assert_eq!(
            count(&shape),
            data.len(),
            "constant operand shape {shape:?} does not hold {} elements",
            data.len()
        );
        Self { shape, data }
    }

    #[must_use]
    pub fn operand(&self) -> Operand<'_> {
        Operand::new(&self.data, &self.shape)
    }
}

/// Everything a binary layer needs besides its runtime inputs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BinaryLayer {
    /// `None` models a node whose parameters were never attached.
    pub param: Option<BinaryParam>,
    pub resource: Option<ElementResource>,
}

impl BinaryLayer {
    /// Layer with an operator and no stored constant.
    #[must_use]
    pub fn new(op: OpType) -> Self {
        Self {
            param: Some(BinaryParam::new(op)),
            resource: None,
        }
    }

    /// Attaches a constant operand at `weight_input_index`.
    #[must_use]
    pub fn with_constant(mut self, resource: ElementResource, weight_input_index: usize) -> Self {
        self.param = self
            .param
            .map(|p| p.with_weight_index(weight_input_index));
        self.resource = Some(resource);
        self
    }
}
