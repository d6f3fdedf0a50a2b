// Library root
// -----------
// The binary (`main.rs`) strings these modules together into one run:
// find the script, log in, pick a course, draw occlusions, write the PNGs
// and launch the script.
//
// Module responsibilities:
// - `cli`: command-line arguments and logger setup.
// - `api`: HTTP calls to the MyLittleWordLand backend.
// - `ui`: terminal prompts and spinners.
// - `occlusion`: rectangles and the drag gesture, no GUI types.
// - `canvas`: the image window.
// - `export`: masked and cropped PNG output.
// - `launcher`: locating and starting the companion script.
pub mod api;
pub mod canvas;
pub mod cli;
pub mod export;
pub mod launcher;
pub mod occlusion;
pub mod ui;
