use crate::math::{Mat4, Quat, Vec2, Vec3, mat4_from_cols_array, quat_from_array};

use super::DecodeError;

/// Lenient little-endian decoder over a byte slice.
///
/// Every `read_*` call either consumes its bytes or, when the data is
/// exhausted, returns a zero value and records the overflow. Counts that
/// promise more items than the remaining bytes can hold are clamped so a
/// corrupt length never triggers a huge allocation.
pub struct BinaryReader<'a> {
    data: &'a [u8],
    offset: usize,
    context: &'static str,
    /// First failed read as `(offset, requested)`.
    overflow: Option<(usize, usize)>,
}

impl<'a> BinaryReader<'a> {
    /// Creates a reader. `context` names the payload in log messages.
    pub fn new(data: &'a [u8], context: &'static str) -> Self {
        Self {
            data,
            offset: 0,
            context,
            overflow: None,
        }
    }

    /// Current read position in bytes.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Returns `true` once any read has run past the end of the data.
    pub fn overflowed(&self) -> bool {
        self.overflow.is_some()
    }

    /// Checks the decode strictly: no overflow and no trailing bytes.
    pub fn finish(&self) -> Result<(), DecodeError> {
        if let Some((offset, requested)) = self.overflow {
            return Err(DecodeError::Truncated {
                context: self.context,
                offset,
                requested,
            });
        }
        if self.remaining() > 0 {
            return Err(DecodeError::TrailingBytes {
                context: self.context,
                remaining: self.remaining(),
            });
        }
        Ok(())
    }

    fn flag_overflow(&mut self, requested: usize) {
        if self.overflow.is_none() {
            log::warn!(
                "{}: read of {} bytes at offset {} overflows buffer of {} bytes, zero-filling",
                self.context,
                requested,
                self.offset,
                self.data.len()
            );
            self.overflow = Some((self.offset, requested));
        }
    }

    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        if self.remaining() < len {
            self.flag_overflow(len);
            self.offset = self.data.len();
            return None;
        }
        let bytes = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Some(bytes)
    }

    fn read_bytes<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        if let Some(bytes) = self.take(N) {
            out.copy_from_slice(bytes);
        }
        out
    }

    /// Reads a `u32`.
    pub fn read_u32(&mut self) -> u32 {
        u32::from_le_bytes(self.read_bytes())
    }

    /// Reads an `i32`.
    pub fn read_i32(&mut self) -> i32 {
        i32::from_le_bytes(self.read_bytes())
    }

    /// Reads a `u64`.
    pub fn read_u64(&mut self) -> u64 {
        u64::from_le_bytes(self.read_bytes())
    }

    /// Reads an `f32`.
    pub fn read_f32(&mut self) -> f32 {
        f32::from_le_bytes(self.read_bytes())
    }

    /// Reads two `f32`s.
    pub fn read_vec2(&mut self) -> Vec2 {
        let x = self.read_f32();
        let y = self.read_f32();
        Vec2::new(x, y)
    }

    /// Reads three `f32`s.
    pub fn read_vec3(&mut self) -> Vec3 {
        let x = self.read_f32();
        let y = self.read_f32();
        let z = self.read_f32();
        Vec3::new(x, y, z)
    }

    /// Reads a quaternion stored as `x, y, z, w`.
    ///
    /// An all-zero quaternion (the overflow value) is returned as-is; callers
    /// normalize before building matrices.
    pub fn read_quat(&mut self) -> Quat {
        let x = self.read_f32();
        let y = self.read_f32();
        let z = self.read_f32();
        let w = self.read_f32();
        quat_from_array([x, y, z, w])
    }

    /// Reads a 4x4 matrix stored as 16 column-major `f32`s.
    pub fn read_mat4(&mut self) -> Mat4 {
        let mut cols = [0.0f32; 16];
        for value in &mut cols {
            *value = self.read_f32();
        }
        mat4_from_cols_array(&cols)
    }

    /// Reads a `u64` item count and clamps it to what the remaining bytes
    /// can hold, given the minimum encoded size of one item.
    pub fn read_count(&mut self, min_item_size: usize) -> usize {
        let raw = self.read_u64();
        let fits = (self.remaining() / min_item_size.max(1)) as u64;
        if raw > fits {
            let requested = usize::try_from(raw)
                .unwrap_or(usize::MAX)
                .saturating_mul(min_item_size.max(1));
            self.flag_overflow(requested);
            // `fits` never exceeds the buffer length, so it fits in usize.
            return fits as usize;
        }
        raw as usize
    }

    /// Reads a length-prefixed string. Invalid UTF-8 is replaced lossily.
    pub fn read_string(&mut self) -> String {
        let len = self.read_count(1);
        match self.take(len) {
            Some(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            None => String::new(),
        }
    }

    /// Reads a length-prefixed array of `f32`.
    pub fn read_f32_array(&mut self) -> Vec<f32> {
        let count = self.read_count(4);
        (0..count).map(|_| self.read_f32()).collect()
    }

    /// Reads a length-prefixed array of 3-component vectors.
    pub fn read_vec3_array(&mut self) -> Vec<Vec3> {
        let count = self.read_count(12);
        (0..count).map(|_| self.read_vec3()).collect()
    }

    /// Reads a length-prefixed array of `xyzw` quaternions.
    pub fn read_quat_array(&mut self) -> Vec<Quat> {
        let count = self.read_count(16);
        (0..count).map(|_| self.read_quat()).collect()
    }
}
