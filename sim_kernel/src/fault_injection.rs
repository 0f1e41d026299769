//! Deterministic fault injection for testing
//!
//! Lets tests make individual simulated kernel calls fail so start-up
//! error paths can be exercised without real resource exhaustion.
//!
//! ## Example
//!
//! ```
//! use sim_kernel::fault_injection::{FaultPlan, KernelFault};
//!
//! let plan = FaultPlan::new()
//!     .with_fault(KernelFault::FailAllocation)
//!     .with_fault(KernelFault::FailRegister { name: "usb:".to_string() });
//! assert_eq!(plan.faults().len(), 2);
//! ```

/// A kernel call to fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelFault {
    /// Every heap allocation fails
    FailAllocation,

    /// Message queue creation fails
    FailQueueCreate,

    /// Registering this device name fails
    FailRegister { name: String },
}

/// A plan describing all faults to inject
#[derive(Debug, Clone, Default)]
pub struct FaultPlan {
    faults: Vec<KernelFault>,
}

impl FaultPlan {
    /// Creates a new empty fault plan
    pub fn new() -> Self {
        Self { faults: Vec::new() }
    }

    /// Adds a fault to the plan
    pub fn with_fault(mut self, fault: KernelFault) -> Self {
        self.faults.push(fault);
        self
    }

    pub fn faults(&self) -> &[KernelFault] {
        &self.faults
    }

    pub fn fails_allocation(&self) -> bool {
        self.faults.contains(&KernelFault::FailAllocation)
    }

    pub fn fails_queue_create(&self) -> bool {
        self.faults.contains(&KernelFault::FailQueueCreate)
    }

    pub fn fails_register(&self, device: &str) -> bool {
        self.faults
            .iter()
            .any(|f| matches!(f, KernelFault::FailRegister { name } if name == device))
    }
}
