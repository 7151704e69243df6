fn main() {
    build_deps::rerun_if_changed_paths("res/examples/**/*.lox").expect("could not read path");
}
