/// A type that can be written as the contents of a single field.
///
/// Integers are formatted with `itoa` and floating point numbers with
/// `ryu`, both of which never allocate. Booleans are written as `true` or
/// `false`, and `None` as an empty field.
///
/// See `Writer::write_value`.
pub trait Encode {
    /// Append the field contents for this value to `out`.
    fn encode(&self, out: &mut Vec<u8>);
}

impl<'a, T: Encode + ?Sized> Encode for &'a T {
    fn encode(&self, out: &mut Vec<u8>) {
        (**self).encode(out)
    }
}

impl Encode for str {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.as_bytes());
    }
}

impl Encode for String {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.as_bytes());
    }
}

impl Encode for [u8] {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self);
    }
}

impl Encode for Vec<u8> {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self);
    }
}

impl Encode for char {
    fn encode(&self, out: &mut Vec<u8>) {
        let mut buf = [0; 4];
        out.extend_from_slice(self.encode_utf8(&mut buf).as_bytes());
    }
}

impl Encode for bool {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(if *self { b"true" } else { b"false" });
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode(&self, out: &mut Vec<u8>) {
        if let Some(ref value) = *self {
            value.encode(out);
        }
    }
}

macro_rules! encode_int {
    ($($ty:ty),*) => {
        $(
            impl Encode for $ty {
                fn encode(&self, out: &mut Vec<u8>) {
                    let mut buf = itoa::Buffer::new();
                    out.extend_from_slice(buf.format(*self).as_bytes());
                }
            }
        )*
    }
}

macro_rules! encode_float {
    ($($ty:ty),*) => {
        $(
            impl Encode for $ty {
                fn encode(&self, out: &mut Vec<u8>) {
                    let mut buf = ryu::Buffer::new();
                    out.extend_from_slice(buf.format(*self).as_bytes());
                }
            }
        )*
    }
}

encode_int!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);
encode_float!(f32, f64);
