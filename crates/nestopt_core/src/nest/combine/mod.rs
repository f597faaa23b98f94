//! Structural operators over encoded slots.
//!
//! These work per slot and never consult a descriptor, so a plain tensor
//! slot and an optional cell go through the same entry points.

use tracing::trace;

use crate::nest::{NestError, OptionalSlot, OptionalValue, Result, Slot};

/// Same-shaped slot with every numeric leaf at its additive identity.
///
/// Absent optionals stay absent; present optionals are zeroed recursively.
pub fn zeros_like(slot: &Slot) -> Slot {
	match slot {
		Slot::Dense(tensor) => Slot::Dense(tensor.zeros_like()),
		Slot::Sparse(sparse) => Slot::Sparse(sparse.zeros_like()),
		Slot::Optional(cell) => Slot::Optional(zeros_like_optional(cell)),
	}
}

/// Sum of one or more structurally identical slots.
///
/// Absent optionals sum to absent; present optionals sum leafwise. Mixing
/// present and absent operands is rejected.
pub fn add_n(slots: &[Slot]) -> Result<Slot> {
	trace!(operands = slots.len(), "add_n");
	let (first, rest) = slots.split_first().ok_or(NestError::EmptyAddN)?;
	match first {
		Slot::Dense(tensor) => {
			let mut acc = tensor.clone();
			for slot in rest {
				let Slot::Dense(other) = slot else {
					return Err(mismatch(first, slot));
				};
				acc = acc.add(other)?;
			}
			Ok(Slot::Dense(acc))
		}
		Slot::Sparse(sparse) => {
			let mut acc = sparse.clone();
			for slot in rest {
				let Slot::Sparse(other) = slot else {
					return Err(mismatch(first, slot));
				};
				acc = acc.add(other)?;
			}
			Ok(Slot::Sparse(acc))
		}
		Slot::Optional(_) => {
			let mut cells = Vec::with_capacity(slots.len());
			for slot in slots {
				let Slot::Optional(cell) = slot else {
					return Err(mismatch(first, slot));
				};
				cells.push(cell);
			}
			add_n_optional(&cells).map(Slot::Optional)
		}
	}
}

fn zeros_like_optional(cell: &OptionalSlot) -> OptionalSlot {
	match cell.slots() {
		None => OptionalSlot::absent(),
		Some(slots) => OptionalSlot::present(slots.iter().map(zeros_like).collect()),
	}
}

fn add_n_optional(cells: &[&OptionalSlot]) -> Result<OptionalSlot> {
	let Some((first, rest)) = cells.split_first() else {
		return Err(NestError::EmptyAddN);
	};
	if let Some(index) = rest.iter().position(|cell| cell.is_present() != first.is_present()) {
		return Err(NestError::PresenceMismatch { index: index + 1 });
	}
	let Some(first_slots) = first.slots() else {
		return Ok(OptionalSlot::absent());
	};

	let mut payloads = Vec::with_capacity(cells.len());
	for cell in cells {
		let slots = cell.slots().unwrap_or_default();
		if slots.len() != first_slots.len() {
			return Err(NestError::IncompatibleOperands {
				left: format!("optional of {} slots", first_slots.len()),
				right: format!("optional of {} slots", slots.len()),
			});
		}
		payloads.push(slots);
	}

	let mut out = Vec::with_capacity(first_slots.len());
	let mut column = Vec::with_capacity(payloads.len());
	for position in 0..first_slots.len() {
		column.clear();
		column.extend(payloads.iter().map(|slots| slots[position].clone()));
		out.push(add_n(&column)?);
	}
	Ok(OptionalSlot::present(out))
}

fn mismatch(left: &Slot, right: &Slot) -> NestError {
	NestError::IncompatibleOperands {
		left: left.spec().to_string(),
		right: right.spec().to_string(),
	}
}

/// Zero-fill an optional. Absent stays absent.
pub fn zero_fill(value: &OptionalValue) -> OptionalValue {
	OptionalValue::from_slot(zeros_like_optional(value.slot()), value.shared_spec().clone())
}

/// Add two optionals with compatible descriptors.
pub fn pairwise_add(left: &OptionalValue, right: &OptionalValue) -> Result<OptionalValue> {
	let left_desc = left.descriptor();
	let right_desc = right.descriptor();
	if !left_desc.is_compatible_with(&right_desc) {
		return Err(NestError::IncompatibleOperands {
			left: left_desc.to_string(),
			right: right_desc.to_string(),
		});
	}
	let cell = add_n_optional(&[left.slot(), right.slot()])?;
	Ok(OptionalValue::from_slot(cell, left.shared_spec().clone()))
}
