pub mod adc16;
