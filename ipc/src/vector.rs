//! Bounds-checked view over a vectorized request's descriptors

use crate::IoBuffer;
use thiserror::Error;

/// Errors decoding caller-supplied descriptors
///
/// All of these surface to the caller as invalid-argument.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IpcError {
    /// The declared input/output counts exceed the descriptors present
    #[error("descriptor counts in={num_in} io={num_io} exceed {present} descriptors")]
    DescriptorCountMismatch {
        num_in: usize,
        num_io: usize,
        present: usize,
    },

    /// A required input descriptor is missing
    #[error("missing input descriptor {index}")]
    MissingInput { index: usize },

    /// A required output descriptor is missing
    #[error("missing output descriptor {index}")]
    MissingOutput { index: usize },

    /// A descriptor is too short for the value it must carry
    #[error("buffer of {len} bytes is too small, need {needed}")]
    BufferTooSmall { needed: usize, len: usize },

    /// A path buffer is not valid UTF-8
    #[error("path is not valid UTF-8")]
    InvalidPath,
}

/// Input/output partition of a descriptor vector
///
/// Constructed once per request. Inputs are read-only; outputs are the
/// only descriptors a handler may write.
#[derive(Debug)]
pub struct IoVector<'a> {
    inputs: &'a [IoBuffer],
    outputs: &'a mut [IoBuffer],
}

impl<'a> IoVector<'a> {
    /// Partitions `descriptors` into `num_in` inputs followed by `num_io`
    /// outputs
    ///
    /// Fails if the declared counts reach past the descriptors present.
    /// Trailing descriptors beyond the declared counts are ignored.
    pub fn new(
        descriptors: &'a mut [IoBuffer],
        num_in: u32,
        num_io: u32,
    ) -> Result<Self, IpcError> {
        let num_in = num_in as usize;
        let num_io = num_io as usize;
        let present = descriptors.len();
        let mismatch = IpcError::DescriptorCountMismatch {
            num_in,
            num_io,
            present,
        };

        let declared = num_in.checked_add(num_io).ok_or(mismatch.clone())?;
        if declared > present {
            return Err(mismatch);
        }

        let (inputs, rest) = descriptors.split_at_mut(num_in);
        Ok(Self {
            inputs,
            outputs: &mut rest[..num_io],
        })
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// Checks that at least `inputs` inputs and `outputs` outputs exist
    pub fn require(&self, inputs: usize, outputs: usize) -> Result<(), IpcError> {
        if self.inputs.len() < inputs {
            return Err(IpcError::MissingInput {
                index: self.inputs.len(),
            });
        }
        if self.outputs.len() < outputs {
            return Err(IpcError::MissingOutput {
                index: self.outputs.len(),
            });
        }
        Ok(())
    }

    pub fn input(&self, index: usize) -> Result<&IoBuffer, IpcError> {
        self.inputs
            .get(index)
            .ok_or(IpcError::MissingInput { index })
    }

    pub fn output_mut(&mut self, index: usize) -> Result<&mut IoBuffer, IpcError> {
        self.outputs
            .get_mut(index)
            .ok_or(IpcError::MissingOutput { index })
    }

    pub fn inputs(&self) -> &[IoBuffer] {
        self.inputs
    }

    pub fn outputs(&self) -> &[IoBuffer] {
        &self.outputs[..]
    }

    pub fn outputs_mut(&mut self) -> &mut [IoBuffer] {
        &mut self.outputs[..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptors(n: usize) -> Vec<IoBuffer> {
        (0..n).map(|i| IoBuffer::from_word(i as u32)).collect()
    }

    #[test]
    fn test_partition_splits_inputs_then_outputs() {
        let mut vector = descriptors(4);
        let view = IoVector::new(&mut vector, 2, 2).unwrap();
        assert_eq!(view.input_count(), 2);
        assert_eq!(view.output_count(), 2);
        assert_eq!(view.input(1).unwrap().word().unwrap(), 1);
        assert_eq!(view.outputs()[0].word().unwrap(), 2);
    }

    #[test]
    fn test_counts_beyond_descriptors_rejected() {
        let mut vector = descriptors(2);
        let err = IoVector::new(&mut vector, 2, 1).unwrap_err();
        assert_eq!(
            err,
            IpcError::DescriptorCountMismatch {
                num_in: 2,
                num_io: 1,
                present: 2
            }
        );
    }

    #[test]
    fn test_overflowing_counts_rejected() {
        let mut vector = descriptors(1);
        assert!(IoVector::new(&mut vector, u32::MAX, u32::MAX).is_err());
    }

    #[test]
    fn test_trailing_descriptors_ignored() {
        let mut vector = descriptors(5);
        let view = IoVector::new(&mut vector, 1, 1).unwrap();
        assert_eq!(view.inputs().len(), 1);
        assert_eq!(view.outputs().len(), 1);
    }

    #[test]
    fn test_require_reports_missing_side() {
        let mut vector = descriptors(2);
        let view = IoVector::new(&mut vector, 1, 1).unwrap();
        assert!(view.require(1, 1).is_ok());
        assert_eq!(view.require(2, 1), Err(IpcError::MissingInput { index: 1 }));
        assert_eq!(
            view.require(1, 2),
            Err(IpcError::MissingOutput { index: 1 })
        );
    }

    #[test]
    fn test_output_mut_writes_only_outputs() {
        let mut vector = descriptors(2);
        {
            let mut view = IoVector::new(&mut vector, 1, 1).unwrap();
            view.output_mut(0).unwrap().set_word(99).unwrap();
            assert!(view.output_mut(1).is_err());
        }
        assert_eq!(vector[0].word().unwrap(), 0);
        assert_eq!(vector[1].word().unwrap(), 99);
    }
}
