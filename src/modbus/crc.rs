/// CRC-16/MODBUS, reflected polynomial 0xA001, initial value 0xFFFF.
/// Appended to RTU frames low byte first.
pub fn crc16(data: &[u8]) -> u16 {
    data.iter().fold(0xFFFFu16, |mut crc, &byte| {
        crc ^= u16::from(byte);
        for _ in 0..8 {
            let lsb = crc & 0x0001;
            crc >>= 1;
            if lsb != 0 {
                crc ^= 0xA001;
            }
        }
        crc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_check_value() {
        // standard CRC-16/MODBUS check input
        assert_eq!(crc16(b"123456789"), 0x4B37);
    }

    #[test]
    fn read_request_frame_vector() {
        // "read holding register 0 of slave 1": trailer on the wire is 84 0A
        let frame = [0x01, 0x03, 0x00, 0x00, 0x00, 0x01];
        let crc = crc16(&frame);
        assert_eq!(crc.to_le_bytes(), [0x84, 0x0A]);
    }

    #[test]
    fn empty_input_yields_initial_value() {
        assert_eq!(crc16(&[]), 0xFFFF);
    }
}
