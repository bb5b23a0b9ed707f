fn main() {
    println!("cargo:rerun-if-changed=assets");

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
