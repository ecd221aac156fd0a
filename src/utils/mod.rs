pub mod sample_ops;
