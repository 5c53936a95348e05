//! Per-object binary coverage mapping reader.
//!
//! Each instrumented object file carries a coverage section describing, per
//! function, a counter-expression table and a region table. The reader
//! decodes the whole section once; repeat queries walk the already-decoded
//! records again after a cursor [`reset`](MappingReader::reset).
//!
//! ## Layout (`*.cmap`, little-endian)
//!
//! ```text
//! u64 magic      b"cubcmap\x81"
//! u32 version    currently 1
//! u32 arch_len, arch bytes
//! u32 filename_count, (u32 len, bytes) x filename_count
//! u32 function_count
//! function: u32 name_len, bytes, u64 structural_hash,
//!           u32 expr_count, (u8 op, counter lhs, counter rhs) x expr_count,
//!           u32 region_count,
//!           (u8 kind, u32 file_id, u32 line_start, u32 col_start,
//!            u32 line_end, u32 col_end, counter) x region_count
//! counter:  u8 tag (0 zero, 1 counter ref, 2 expression ref), u32 index
//! ```
//!
//! A readable file whose leading bytes are not the mapping magic is the
//! "no coverage data" case: the loader treats it as success with zero
//! records. Anything else malformed is structural and fatal.

use crate::coverage::wire::ByteCursor;
use crate::result::{CubrirError, CubrirResult};

/// File magic for the coverage mapping container.
pub(crate) const MAPPING_MAGIC: u64 = u64::from_le_bytes(*b"cubcmap\x81");

/// Container version this build understands.
pub(crate) const MAPPING_VERSION: u32 = 1;

/// Kind of a mapped source region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionKind {
    /// A counted basic span of source, attributed one execution counter
    Code,
    /// Filler between real regions; excluded from region coverage
    Gap,
    /// Source excluded from instrumentation (e.g. preprocessed away)
    Skipped,
    /// A branch arm counter; excluded from region coverage and segments
    Branch,
}

impl RegionKind {
    fn decode(raw: u8, offset: usize) -> CubrirResult<Self> {
        match raw {
            0 => Ok(Self::Code),
            1 => Ok(Self::Gap),
            2 => Ok(Self::Skipped),
            3 => Ok(Self::Branch),
            _ => Err(CubrirError::Truncated {
                what: "region kind",
                offset,
            }),
        }
    }
}

/// Reference to an execution count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    /// Always zero
    Zero,
    /// Index into the function's profile counter array
    CounterRef(u32),
    /// Index into the function's expression table
    ExpressionRef(u32),
}

impl Counter {
    fn decode(cursor: &mut ByteCursor<'_>) -> CubrirResult<Self> {
        let offset = cursor.pos();
        let tag = cursor.read_u8("counter tag")?;
        let index = cursor.read_u32("counter index")?;
        match tag {
            0 => Ok(Self::Zero),
            1 => Ok(Self::CounterRef(index)),
            2 => Ok(Self::ExpressionRef(index)),
            _ => Err(CubrirError::Truncated {
                what: "counter tag",
                offset,
            }),
        }
    }
}

/// Operator combining the two sides of a counter expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprOp {
    /// Saturating addition
    Add,
    /// Saturating subtraction
    Subtract,
}

/// One entry in a function's counter-expression table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterExpression {
    /// Combining operator
    pub op: ExprOp,
    /// Left operand
    pub lhs: Counter,
    /// Right operand
    pub rhs: Counter,
}

/// An encoded source region prior to counter resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingRegion {
    /// Region kind
    pub kind: RegionKind,
    /// Index into the object's filename table
    pub file_id: u32,
    /// 1-based start line
    pub line_start: u32,
    /// 1-based start column
    pub col_start: u32,
    /// 1-based end line
    pub line_end: u32,
    /// 1-based end column
    pub col_end: u32,
    /// Counter attributed to the region
    pub counter: Counter,
}

/// Per-function encoded counter-expression and region tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageMappingRecord {
    /// Mangled function name
    pub name: String,
    /// Structural hash embedded at instrumentation time
    pub structural_hash: u64,
    /// Counter-expression table
    pub expressions: Vec<CounterExpression>,
    /// Region table
    pub regions: Vec<MappingRegion>,
}

/// Parsed coverage reader for one object file, with a reusable record cursor
#[derive(Debug)]
pub struct MappingReader {
    arch: String,
    filenames: Vec<String>,
    records: Vec<CoverageMappingRecord>,
    current: usize,
}

impl MappingReader {
    /// Decode a coverage mapping section from raw object bytes.
    ///
    /// # Errors
    ///
    /// [`CubrirError::BadMagic`] when the bytes carry no coverage section
    /// (the recoverable "no data found" case); any other error is
    /// structural and fatal for the batch.
    pub fn parse(bytes: &[u8]) -> CubrirResult<Self> {
        let mut cursor = ByteCursor::new(bytes);
        let magic = cursor.read_u64("mapping magic").map_err(|_| {
            // Too short to even hold the magic: nothing to read here.
            CubrirError::BadMagic {
                what: "coverage mapping",
            }
        })?;
        if magic != MAPPING_MAGIC {
            return Err(CubrirError::BadMagic {
                what: "coverage mapping",
            });
        }
        let version = cursor.read_u32("mapping version")?;
        if version != MAPPING_VERSION {
            return Err(CubrirError::UnsupportedVersion {
                what: "coverage mapping",
                found: version,
                expected: MAPPING_VERSION,
            });
        }

        let arch = cursor.read_string("mapping architecture")?;
        let filename_count = cursor.read_u32("filename count")? as usize;
        let mut filenames = Vec::with_capacity(filename_count.min(1 << 16));
        for _ in 0..filename_count {
            filenames.push(cursor.read_string("filename")?);
        }

        let function_count = cursor.read_u32("function count")? as usize;
        let mut records = Vec::with_capacity(function_count.min(1 << 16));
        for _ in 0..function_count {
            records.push(Self::parse_record(&mut cursor, filenames.len())?);
        }

        tracing::debug!(
            arch = %arch,
            files = filenames.len(),
            functions = records.len(),
            "decoded coverage mapping section"
        );
        Ok(Self {
            arch,
            filenames,
            records,
            current: 0,
        })
    }

    fn parse_record(
        cursor: &mut ByteCursor<'_>,
        filename_limit: usize,
    ) -> CubrirResult<CoverageMappingRecord> {
        let name = cursor.read_string("function name")?;
        let structural_hash = cursor.read_u64("structural hash")?;

        let expr_count = cursor.read_u32("expression count")? as usize;
        let mut expressions = Vec::with_capacity(expr_count.min(1 << 16));
        for _ in 0..expr_count {
            let offset = cursor.pos();
            let op = match cursor.read_u8("expression op")? {
                0 => ExprOp::Add,
                1 => ExprOp::Subtract,
                _ => {
                    return Err(CubrirError::Truncated {
                        what: "expression op",
                        offset,
                    })
                }
            };
            let lhs = Counter::decode(cursor)?;
            let rhs = Counter::decode(cursor)?;
            expressions.push(CounterExpression { op, lhs, rhs });
        }

        let region_count = cursor.read_u32("region count")? as usize;
        let mut regions = Vec::with_capacity(region_count.min(1 << 16));
        for _ in 0..region_count {
            let offset = cursor.pos();
            let kind = RegionKind::decode(cursor.read_u8("region kind")?, offset)?;
            let file_id = cursor.read_u32("region file id")?;
            if file_id as usize >= filename_limit {
                return Err(CubrirError::BadIndex {
                    what: "filename",
                    index: file_id,
                    limit: filename_limit,
                });
            }
            let line_start = cursor.read_u32("region line start")?;
            let col_start = cursor.read_u32("region col start")?;
            let line_end = cursor.read_u32("region line end")?;
            let col_end = cursor.read_u32("region col end")?;
            let counter = Counter::decode(cursor)?;
            regions.push(MappingRegion {
                kind,
                file_id,
                line_start,
                col_start,
                line_end,
                col_end,
                counter,
            });
        }

        // Expression operands referencing the expression table must resolve.
        for expr in &expressions {
            for side in [expr.lhs, expr.rhs] {
                if let Counter::ExpressionRef(index) = side {
                    if index as usize >= expressions.len() {
                        return Err(CubrirError::BadIndex {
                            what: "expression",
                            index,
                            limit: expressions.len(),
                        });
                    }
                }
            }
        }
        for region in &regions {
            if let Counter::ExpressionRef(index) = region.counter {
                if index as usize >= expressions.len() {
                    return Err(CubrirError::BadIndex {
                        what: "expression",
                        index,
                        limit: expressions.len(),
                    });
                }
            }
        }

        Ok(CoverageMappingRecord {
            name,
            structural_hash,
            expressions,
            regions,
        })
    }

    /// Architecture string recorded in the section (may be empty)
    #[must_use]
    pub fn arch(&self) -> &str {
        &self.arch
    }

    /// The object's filename table
    #[must_use]
    pub fn filenames(&self) -> &[String] {
        &self.filenames
    }

    /// Number of function records in the section
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the section holds no function records
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rewind the record cursor to the first record.
    ///
    /// Reuses the already-decoded records; no file bytes are touched.
    pub fn reset(&mut self) {
        self.current = 0;
    }

    /// Advance the cursor, returning the index of the next unread record.
    pub fn advance(&mut self) -> Option<usize> {
        if self.current < self.records.len() {
            let index = self.current;
            self.current += 1;
            Some(index)
        } else {
            None
        }
    }

    /// Record at `index` (as handed out by [`advance`](Self::advance))
    #[must_use]
    pub fn record(&self, index: usize) -> &CoverageMappingRecord {
        &self.records[index]
    }
}

/// Resolve a counter reference against profile counters and an expression
/// table. Arithmetic saturates; a counter index beyond the recorded array
/// reads as zero (stale profiles legitimately carry fewer counters).
pub(crate) fn evaluate_counter(
    counter: Counter,
    counts: &[u64],
    expressions: &[CounterExpression],
) -> u64 {
    evaluate_with_depth(counter, counts, expressions, expressions.len() + 1)
}

fn evaluate_with_depth(
    counter: Counter,
    counts: &[u64],
    expressions: &[CounterExpression],
    depth: usize,
) -> u64 {
    match counter {
        Counter::Zero => 0,
        Counter::CounterRef(index) => counts.get(index as usize).copied().unwrap_or(0),
        Counter::ExpressionRef(index) => {
            // Depth guard: indices are validated at parse time, but a cyclic
            // table would otherwise recurse forever.
            if depth == 0 {
                return 0;
            }
            let Some(expr) = expressions.get(index as usize) else {
                return 0;
            };
            let lhs = evaluate_with_depth(expr.lhs, counts, expressions, depth - 1);
            let rhs = evaluate_with_depth(expr.rhs, counts, expressions, depth - 1);
            match expr.op {
                ExprOp::Add => lhs.saturating_add(rhs),
                ExprOp::Subtract => lhs.saturating_sub(rhs),
            }
        }
    }
}
