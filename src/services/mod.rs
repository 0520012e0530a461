pub mod origin_gate;
