#[cfg(test)]
mod tests {
    /*
       Bit order of the 3-wire transaction: idle, 8 address bits then 16 data
       bits MSB first, each as a clock low / clock high pair, idle.
    */
    use adc16_globals::adc16::{IDLE, SCLK, TRANSACTION_LEN};
    use adc16_globals::{Chip, ChipSelect};
    use adc16_wire::{ThreeWireDecoder, Transaction};

    #[test]
    fn all_zero_transaction() {
        let cs = ChipSelect::SNAP_ALL;
        let words = Transaction::new(cs, 0x00, 0x0000).encode();

        assert_eq!(words.len(), TRANSACTION_LEN);
        assert_eq!(words.len(), 50);
        assert_eq!(words[0], IDLE);
        assert_eq!(words[49], IDLE);
        for pair in words[1..49].chunks(2) {
            assert_eq!(pair, [0b111, 0b111 | SCLK]);
        }
    }

    #[test]
    fn all_ones_transaction() {
        let cs = ChipSelect::single(Chip::A);
        let words = Transaction::new(cs, 0xff, 0xffff).encode();

        assert_eq!(words.len(), 50);
        for pair in words[1..49].chunks(2) {
            assert_eq!(pair, [0x101, 0x301]);
        }
    }

    #[test]
    fn address_precedes_data_msb_first() {
        let words = Transaction::new(ChipSelect::single(Chip::B), 0x80, 0x0001).encode();
        let bits: Vec<u32> = words[1..49]
            .chunks(2)
            .map(|pair| (pair[1] >> 8) & 1)
            .collect();

        assert_eq!(bits[0], 1);
        assert!(bits[1..23].iter().all(|b| *b == 0));
        assert_eq!(bits[23], 1);
    }

    #[test]
    fn chip_select_bits_follow_mask() {
        for (cs, bits) in [
            (ChipSelect::single(Chip::A), 0b001),
            (ChipSelect::single(Chip::B), 0b010),
            (ChipSelect::single(Chip::C), 0b100),
            (ChipSelect::SNAP_ALL, 0b111),
        ] {
            let words = Transaction::new(cs, 0x31, 0x0004).encode();
            assert!(words[1..49].iter().all(|w| w & 0xff == bits));
        }
    }

    #[test]
    fn decoder_recovers_transactions() {
        let sent = [
            Transaction::new(ChipSelect::SNAP_ALL, 0x45, 0x0001),
            Transaction::new(ChipSelect::single(Chip::C), 0x2a, 0xabcd),
            Transaction::new(ChipSelect::from_bits(0xff), 0xff, 0xffff),
        ];
        let mut decoder = ThreeWireDecoder::new();
        let received: Vec<Transaction> = sent
            .iter()
            .flat_map(|t| t.encode())
            .filter_map(|w| decoder.push(w))
            .collect();

        assert_eq!(received, sent);
    }
}
