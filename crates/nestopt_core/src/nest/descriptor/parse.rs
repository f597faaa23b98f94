use std::collections::BTreeMap;

use crate::nest::{DType, Descriptor, Dim, NestError, Result, Shape};

/// Deepest aggregate or optional nesting above a leaf accepted in descriptor text.
pub(crate) const MAX_DESCRIPTOR_DEPTH: usize = 64;

/// Parse descriptor text such as `{a: float32[], b: (string[1], optional(int32[?]))}`.
pub(crate) fn parse_descriptor(input: &str) -> Result<Descriptor> {
	let mut parser = Parser {
		input,
		bytes: input.as_bytes(),
		idx: 0,
		depth: 0,
	};
	let descriptor = parser.descriptor()?;
	parser.skip_ws();
	if parser.idx < parser.bytes.len() {
		return Err(parser.error("unexpected trailing input"));
	}
	Ok(descriptor)
}

/// Whether a mapping key can be written without quotes.
pub(crate) fn is_bare_key(key: &str) -> bool {
	!key.is_empty() && key.bytes().all(is_ident_byte)
}

fn is_ident_byte(byte: u8) -> bool {
	byte.is_ascii_alphanumeric() || byte == b'_'
}

struct Parser<'a> {
	input: &'a str,
	bytes: &'a [u8],
	idx: usize,
	depth: usize,
}

impl<'a> Parser<'a> {
	fn descriptor(&mut self) -> Result<Descriptor> {
		if self.depth > MAX_DESCRIPTOR_DEPTH {
			return Err(self.error("nesting too deep"));
		}
		self.depth += 1;
		let descriptor = self.descriptor_inner();
		self.depth -= 1;
		descriptor
	}

	fn descriptor_inner(&mut self) -> Result<Descriptor> {
		self.skip_ws();
		match self.peek() {
			Some(b'(') => self.sequence(),
			Some(b'{') => self.mapping(),
			Some(byte) if is_ident_byte(byte) => {
				let start = self.idx;
				let word = self.ident();
				match word {
					"optional" => {
						self.expect(b'(')?;
						let inner = self.descriptor()?;
						self.expect(b')')?;
						Ok(Descriptor::optional(inner))
					}
					"sparse" => {
						self.skip_ws();
						let start = self.idx;
						let word = self.ident();
						let dtype = DType::from_name(word).ok_or_else(|| self.error_at(start, "unknown dtype"))?;
						Ok(Descriptor::sparse(dtype, self.shape()?))
					}
					_ => {
						let dtype = DType::from_name(word).ok_or_else(|| self.error_at(start, "unknown dtype"))?;
						Ok(Descriptor::tensor(dtype, self.shape()?))
					}
				}
			}
			_ => Err(self.error("expected descriptor")),
		}
	}

	fn sequence(&mut self) -> Result<Descriptor> {
		self.expect(b'(')?;
		let mut items = Vec::new();
		loop {
			self.skip_ws();
			if self.eat(b')') {
				return Ok(Descriptor::Sequence(items));
			}
			items.push(self.descriptor()?);
			self.skip_ws();
			if !self.eat(b',') {
				self.expect(b')')?;
				return Ok(Descriptor::Sequence(items));
			}
		}
	}

	fn mapping(&mut self) -> Result<Descriptor> {
		self.expect(b'{')?;
		let mut entries = BTreeMap::new();
		loop {
			self.skip_ws();
			if self.eat(b'}') {
				return Ok(Descriptor::Mapping(entries));
			}
			let start = self.idx;
			let key = self.key()?;
			self.expect(b':')?;
			let item = self.descriptor()?;
			if entries.insert(key.into_boxed_str(), item).is_some() {
				return Err(self.error_at(start, "duplicate mapping key"));
			}
			self.skip_ws();
			if !self.eat(b',') {
				self.expect(b'}')?;
				return Ok(Descriptor::Mapping(entries));
			}
		}
	}

	fn key(&mut self) -> Result<String> {
		if !self.eat(b'"') {
			let key = self.ident();
			if key.is_empty() {
				return Err(self.error("expected mapping key"));
			}
			return Ok(key.to_owned());
		}

		let input = self.input;
		let mut out = String::new();
		let mut chars = input[self.idx..].char_indices();
		while let Some((offset, ch)) = chars.next() {
			match ch {
				'"' => {
					self.idx += offset + 1;
					return Ok(out);
				}
				'\\' => match chars.next() {
					Some((_, escaped)) => out.push(escaped),
					None => break,
				},
				ch => out.push(ch),
			}
		}
		Err(self.error("unterminated quoted key"))
	}

	fn shape(&mut self) -> Result<Shape> {
		self.expect(b'[')?;
		self.skip_ws();
		if self.eat(b'*') {
			self.expect(b']')?;
			return Ok(Shape::unknown_rank());
		}

		let mut dims = Vec::new();
		loop {
			self.skip_ws();
			if self.eat(b']') {
				return Ok(Shape::new(dims));
			}
			if self.eat(b'?') {
				dims.push(Dim::Unknown);
			} else {
				let start = self.idx;
				while self.peek().is_some_and(|byte| byte.is_ascii_digit()) {
					self.idx += 1;
				}
				if start == self.idx {
					return Err(self.error("expected dimension"));
				}
				let extent = self.input[start..self.idx].parse::<usize>().map_err(|_| self.error_at(start, "dimension out of range"))?;
				dims.push(Dim::Known(extent));
			}
			self.skip_ws();
			if !self.eat(b',') {
				self.expect(b']')?;
				return Ok(Shape::new(dims));
			}
		}
	}

	fn ident(&mut self) -> &'a str {
		let input = self.input;
		let start = self.idx;
		while self.peek().is_some_and(is_ident_byte) {
			self.idx += 1;
		}
		&input[start..self.idx]
	}

	fn skip_ws(&mut self) {
		while self.peek().is_some_and(|byte| byte.is_ascii_whitespace()) {
			self.idx += 1;
		}
	}

	fn peek(&self) -> Option<u8> {
		self.bytes.get(self.idx).copied()
	}

	fn eat(&mut self, byte: u8) -> bool {
		if self.peek() == Some(byte) {
			self.idx += 1;
			return true;
		}
		false
	}

	fn expect(&mut self, byte: u8) -> Result<()> {
		self.skip_ws();
		if self.eat(byte) {
			return Ok(());
		}
		Err(self.error(match byte {
			b'(' => "expected '('",
			b')' => "expected ')'",
			b'[' => "expected '['",
			b']' => "expected ']'",
			b'{' => "expected '{'",
			b'}' => "expected '}'",
			b':' => "expected ':'",
			_ => "unexpected character",
		}))
	}

	fn error(&self, reason: &'static str) -> NestError {
		self.error_at(self.idx, reason)
	}

	fn error_at(&self, at: usize, reason: &'static str) -> NestError {
		NestError::InvalidDescriptor {
			input: self.input.to_owned(),
			at,
			reason,
		}
	}
}
