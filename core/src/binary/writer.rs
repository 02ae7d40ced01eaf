use crate::math::{Mat4, Quat, Vec2, Vec3, mat4_to_cols_array, quat_to_array};

/// Little-endian encoder producing the layout [`BinaryReader`](super::BinaryReader) reads.
#[derive(Debug, Default, Clone)]
pub struct BinaryWriter {
    buf: Vec<u8>,
}

impl BinaryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_f32(&mut self, v: f32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_vec2(&mut self, v: &Vec2) {
        self.write_f32(v.x);
        self.write_f32(v.y);
    }

    pub fn write_vec3(&mut self, v: &Vec3) {
        self.write_f32(v.x);
        self.write_f32(v.y);
        self.write_f32(v.z);
    }

    /// Writes `x, y, z, w`.
    pub fn write_quat(&mut self, q: &Quat) {
        for c in quat_to_array(*q) {
            self.write_f32(c);
        }
    }

    /// Writes 16 column-major floats.
    pub fn write_mat4(&mut self, m: &Mat4) {
        for c in mat4_to_cols_array(m) {
            self.write_f32(c);
        }
    }

    /// Writes a `u64` count prefix.
    pub fn write_count(&mut self, count: usize) {
        self.write_u64(count as u64);
    }

    pub fn write_string(&mut self, s: &str) {
        self.write_count(s.len());
        self.buf.extend_from_slice(s.as_bytes());
    }

    pub fn write_f32_array(&mut self, values: &[f32]) {
        self.write_count(values.len());
        for v in values {
            self.write_f32(*v);
        }
    }

    pub fn write_vec3_array(&mut self, values: &[Vec3]) {
        self.write_count(values.len());
        for v in values {
            self.write_vec3(v);
        }
    }

    pub fn write_quat_array(&mut self, values: &[Quat]) {
        self.write_count(values.len());
        for q in values {
            self.write_quat(q);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_is_length_prefixed() {
        let mut w = BinaryWriter::new();
        w.write_string("hip");
        assert_eq!(w.as_bytes(), &[3, 0, 0, 0, 0, 0, 0, 0, b'h', b'i', b'p']);
    }

    #[test]
    fn quat_is_written_xyzw() {
        let mut w = BinaryWriter::new();
        w.write_quat(&crate::math::quat_from_xyzw(1.0, 2.0, 3.0, 4.0));
        let bytes = w.into_bytes();
        assert_eq!(&bytes[0..4], &1.0f32.to_le_bytes());
        assert_eq!(&bytes[12..16], &4.0f32.to_le_bytes());
    }
}
