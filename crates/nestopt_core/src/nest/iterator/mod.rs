use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::nest::{Describe, Descriptor, NestError, OptionalSlot, OptionalValue, Result, Value};

/// Label and repetition settings for an [`ElementIterator`].
#[derive(Debug, Clone)]
pub struct IteratorOptions {
	/// Resource label reported in not-ready errors and logs.
	pub label: String,
	/// Number of passes over the elements.
	pub repeat: usize,
}

impl Default for IteratorOptions {
	fn default() -> Self {
		Self {
			label: "iterator".to_owned(),
			repeat: 1,
		}
	}
}

impl IteratorOptions {
	/// Default options with `repeat` passes.
	pub fn repeated(repeat: usize) -> Self {
		Self {
			repeat,
			..Self::default()
		}
	}
}

struct IterState {
	initialized: bool,
	position: usize,
}

/// Shared iterator resource that reports end-of-sequence as an absent optional.
///
/// Clones share one cursor.
#[derive(Clone)]
pub struct ElementIterator {
	elements: Arc<[Value]>,
	element_spec: Arc<Descriptor>,
	options: Arc<IteratorOptions>,
	state: Arc<Mutex<IterState>>,
}

impl ElementIterator {
	/// Iterator that must be initialized before elements can be read.
	pub fn initializable(elements: Vec<Value>, options: IteratorOptions) -> Result<Self> {
		let spec = infer_element_spec(&elements)?;
		Self::with_spec(spec, elements, options, false)
	}

	/// Iterator that is ready immediately.
	pub fn one_shot(elements: Vec<Value>, options: IteratorOptions) -> Result<Self> {
		let spec = infer_element_spec(&elements)?;
		Self::with_spec(spec, elements, options, true)
	}

	/// Iterator over elements checked against an explicit spec.
	pub fn with_spec(element_spec: Descriptor, elements: Vec<Value>, options: IteratorOptions, initialized: bool) -> Result<Self> {
		for element in &elements {
			let got = element.describe();
			if !element_spec.is_compatible_with(&got) {
				return Err(NestError::ShapeMismatch {
					expected: element_spec.to_string(),
					got: got.to_string(),
				});
			}
		}
		Ok(Self {
			elements: elements.into(),
			element_spec: Arc::new(element_spec),
			options: Arc::new(options),
			state: Arc::new(Mutex::new(IterState { initialized, position: 0 })),
		})
	}

	/// Descriptor shared by every produced element.
	pub fn element_spec(&self) -> &Descriptor {
		&self.element_spec
	}

	/// Whether elements can be read.
	pub fn is_initialized(&self) -> bool {
		self.state.lock().initialized
	}

	/// (Re)start from the first element.
	pub fn initialize(&self) {
		let mut state = self.state.lock();
		state.initialized = true;
		state.position = 0;
		debug!(label = %self.options.label, elements = self.total(), "iterator initialized");
	}

	/// Next element wrapped in an optional; absent once exhausted.
	pub fn get_next_as_optional(&self) -> Result<OptionalValue> {
		let mut state = self.state.lock();
		if !state.initialized {
			return Err(NestError::NotReady {
				resource: self.options.label.clone(),
			});
		}

		if state.position >= self.total() {
			debug!(label = %self.options.label, "iterator exhausted");
			return Ok(OptionalValue::from_slot(OptionalSlot::absent(), self.element_spec.clone()));
		}

		let element = &self.elements[state.position % self.elements.len()];
		state.position += 1;
		Ok(OptionalValue::from_slot(OptionalSlot::present(element.to_slots()), self.element_spec.clone()))
	}

	/// Deferred handle that pulls an element each time it is evaluated.
	pub fn next_handle(&self) -> PendingOptional {
		PendingOptional { iterator: self.clone() }
	}

	fn total(&self) -> usize {
		self.elements.len().saturating_mul(self.options.repeat)
	}
}

/// Not-yet-materialized optional bound to an iterator resource.
///
/// Every evaluation pulls one element, so `has_value` and `get_value` each
/// observe the next position of the underlying iterator.
#[derive(Clone)]
pub struct PendingOptional {
	iterator: ElementIterator,
}

impl PendingOptional {
	/// Descriptor of the value an evaluation would produce.
	pub fn element_spec(&self) -> &Descriptor {
		self.iterator.element_spec()
	}

	/// Pull one element and materialize it.
	pub fn evaluate(&self) -> Result<OptionalValue> {
		self.iterator.get_next_as_optional()
	}

	/// Evaluate and report presence.
	pub fn has_value(&self) -> Result<bool> {
		Ok(self.evaluate()?.has_value())
	}

	/// Evaluate and decode the value.
	pub fn get_value(&self) -> Result<Value> {
		self.evaluate()?.get_value()
	}
}

fn infer_element_spec(elements: &[Value]) -> Result<Descriptor> {
	let Some((first, rest)) = elements.split_first() else {
		return Err(NestError::SpecInference {
			reason: "no elements to infer from".to_owned(),
		});
	};
	rest.iter().try_fold(first.describe(), |acc, element| {
		let got = element.describe();
		acc.most_specific_common(&got).ok_or_else(|| NestError::SpecInference {
			reason: format!("{acc} and {got} have no common descriptor"),
		})
	})
}
