pub mod hmcad1511;
