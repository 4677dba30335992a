use crate::Result;

/// A fixed-size, byte-addressable address space as seen by an emulated processor.
///
/// Multi-byte values are big-endian: the most significant byte lives at the lowest address.
/// Backends only have to provide bulk copies; the scalar helpers are built on top of them and may
/// be overridden with faster paths (see [`PagedMemory`](crate::PagedMemory)).
pub trait AddressSpace {
    fn size(&self) -> u64;

    /// Reads `dst.len()` bytes starting at `address` into `dst`.
    fn read_into(&self, address: u64, dst: &mut [u8]) -> Result<()>;

    /// Writes all of `src` to memory starting at `address`.
    fn write_from(&mut self, address: u64, src: &[u8]) -> Result<()>;

    fn read_u8(&self, address: u64) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_into(address, &mut buf)?;
        Ok(buf[0])
    }

    fn read_u16(&self, address: u64) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.read_into(address, &mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }

    fn read_u32(&self, address: u64) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_into(address, &mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    fn read_u64(&self, address: u64) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.read_into(address, &mut buf)?;
        Ok(u64::from_be_bytes(buf))
    }

    fn write_u8(&mut self, address: u64, value: u8) -> Result<()> {
        self.write_from(address, &[value])
    }

    fn write_u16(&mut self, address: u64, value: u16) -> Result<()> {
        self.write_from(address, &value.to_be_bytes())
    }

    fn write_u32(&mut self, address: u64, value: u32) -> Result<()> {
        self.write_from(address, &value.to_be_bytes())
    }

    fn write_u64(&mut self, address: u64, value: u64) -> Result<()> {
        self.write_from(address, &value.to_be_bytes())
    }
}
