use crate::error::SqlBridgeError;

/// Where a fetch moves the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorOrientation {
    /// The row after the current one; the default.
    Next,
    /// The row before the current one.
    Prior,
    /// The first row of the set.
    First,
    /// The last row of the set.
    Last,
    /// The row at a fixed zero-based offset.
    Absolute(i64),
    /// The row at a signed distance from the current one.
    Relative(i64),
}

impl CursorOrientation {
    /// Map a classic driver fetch-orientation code (0..=5) to an orientation.
    /// `offset` feeds `Absolute` and `Relative`; the other codes ignore it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCursorOrientation` for any code outside the known set,
    /// never a silent default.
    pub fn from_code(code: i32, offset: i64) -> Result<Self, SqlBridgeError> {
        match code {
            0 => Ok(CursorOrientation::Next),
            1 => Ok(CursorOrientation::Prior),
            2 => Ok(CursorOrientation::First),
            3 => Ok(CursorOrientation::Last),
            4 => Ok(CursorOrientation::Absolute(offset)),
            5 => Ok(CursorOrientation::Relative(offset)),
            code => Err(SqlBridgeError::InvalidCursorOrientation { code }),
        }
    }
}

/// Resolve the offset a fetch lands on.
///
/// `current` is the zero-based offset before the fetch (-1 = parked before
/// the first row); `last` is the zero-based index of the final buffered row
/// (-1 for an empty set). A result of -1 means end-of-set: no row, cursor
/// parked before the first row again.
#[must_use]
pub(crate) fn resolve_offset(orientation: CursorOrientation, current: i64, last: i64) -> i64 {
    match orientation {
        CursorOrientation::Next => {
            if current == last {
                -1
            } else {
                current + 1
            }
        }
        CursorOrientation::Prior => {
            if current == -1 { -1 } else { current - 1 }
        }
        CursorOrientation::First => {
            if last == -1 { -1 } else { 0 }
        }
        CursorOrientation::Last => last,
        CursorOrientation::Absolute(offset) => {
            if offset < 0 || offset > last { -1 } else { offset }
        }
        CursorOrientation::Relative(delta) => {
            // Saturate: any delta past either end must land on the sentinel,
            // not overflow.
            let target = current.saturating_add(delta);
            if target < 0 || target > last { -1 } else { target }
        }
    }
}
