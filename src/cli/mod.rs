use crate::converter::index::IndexJson;
use crate::converter::stdrename::load_std_renames;
use crate::converter::{
    Conversion, DependencyConverter, DependencyRenamer, Diagnostics, StdRenames,
};
use crate::error::{Error, Result};
use crate::models::CondaPackageFormat;
use crate::utils::metadata::{WheelInfo, WheelMetadata, read_dist_info, rewrite_requires_dist};
use crate::utils::pyproject::{
    PyProjInfo, add_pyproject_defaults, pyproject_with_defaults, read_pyproject,
};
use clap::{Arg, ArgAction, ArgMatches, Command};
use log::{info, warn};
use std::fs;
use std::path::PathBuf;

/// Command line arguments for whl2conda
#[derive(Debug, Default, Clone)]
pub struct Args {
    /// Unpacked wheel or its `.dist-info` directory
    pub dist_info: Option<PathBuf>,

    /// Project directory holding a pyproject.toml with `[tool.whl2conda]` settings
    pub project_root: Option<PathBuf>,

    /// Rename rules given on the command line, tried before configured ones
    pub dependency_rename: Vec<(String, String)>,

    /// Extra conda dependencies
    pub add_dependency: Vec<String>,

    /// Python version spec override
    pub python: Option<String>,

    pub build_number: Option<u64>,

    /// Conda package name override
    pub name: Option<String>,

    /// Standard renames file to use instead of the cached one
    pub renames_file: Option<PathBuf>,

    /// Whether to skip the standard renames table
    pub no_std_renames: bool,

    /// Whether to rewrite METADATA so base dependencies move to an extra
    pub rewrite_metadata: bool,

    /// Output package format, used for the reported package file name
    pub format: Option<CondaPackageFormat>,

    /// Where to write index.json, overrides the configured out-dir
    pub out: Option<PathBuf>,

    /// Directory or pyproject.toml to add default settings to
    pub init_config: Option<PathBuf>,

    pub verbose: bool,

    pub quiet: bool,
}

impl Args {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        let renames: Vec<String> = matches
            .get_many::<String>("dependency-rename")
            .unwrap_or_default()
            .cloned()
            .collect();

        Args {
            dist_info: matches.get_one::<PathBuf>("DIST_INFO_DIR").cloned(),
            project_root: matches.get_one::<PathBuf>("project-root").cloned(),
            dependency_rename: renames
                .chunks_exact(2)
                .map(|pair| (pair[0].clone(), pair[1].clone()))
                .collect(),
            add_dependency: matches
                .get_many::<String>("add-dependency")
                .unwrap_or_default()
                .cloned()
                .collect(),
            python: matches.get_one::<String>("python").cloned(),
            build_number: matches.get_one::<u64>("build-number").copied(),
            name: matches.get_one::<String>("name").cloned(),
            renames_file: matches.get_one::<PathBuf>("renames-file").cloned(),
            no_std_renames: matches.get_flag("no-std-renames"),
            rewrite_metadata: matches.get_flag("rewrite-metadata"),
            format: matches.get_one::<CondaPackageFormat>("format").copied(),
            out: matches.get_one::<PathBuf>("out").cloned(),
            init_config: matches.get_one::<PathBuf>("init-config").cloned(),
            verbose: matches.get_flag("verbose"),
            quiet: matches.get_flag("quiet"),
        }
    }
}

/// Builds the command line definition
pub fn command() -> Command {
    let mut cmd = Command::new("whl2conda")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Converts the dependencies of a pure python wheel into a conda package index")
        .long_about(
            "whl2conda reads the metadata of an unpacked pure python wheel, translates its \
            pypi dependencies into conda dependencies and writes the resulting conda \
            index.json. Package names are mapped through user supplied rename rules and the \
            conda-forge standard renames table, and version specs are translated into conda syntax.",
        );

    cmd = cmd.arg(
        Arg::new("DIST_INFO_DIR")
            .help("Unpacked wheel or .dist-info directory to convert")
            .long_help(
                "Directory of an unpacked wheel, or the .dist-info directory inside it. \
                Both METADATA and WHEEL are read from there. Defaults to the wheel-dir \
                setting of --project-root.",
            )
            .value_parser(clap::value_parser!(PathBuf))
            .required_unless_present_any(["init-config", "project-root"]),
    );

    cmd = cmd.arg(
        Arg::new("project-root")
            .long("project-root")
            .value_name("DIR")
            .help("Project directory with [tool.whl2conda] settings in pyproject.toml")
            .value_parser(clap::value_parser!(PathBuf)),
    );

    cmd = cmd.arg(
        Arg::new("dependency-rename")
            .short('R')
            .long("dependency-rename")
            .num_args(2)
            .value_names(["PATTERN", "REPLACEMENT"])
            .help("Rename pypi dependencies matching PATTERN to REPLACEMENT")
            .long_help(
                "Renames pypi dependencies whose whole name matches the regular expression \
                PATTERN. REPLACEMENT may refer to groups of the pattern as \\1, \\g<name>, \
                $1 or ${name}. An empty REPLACEMENT drops the dependency. May be given \
                several times; the first matching rule wins and rules given here are \
                tried before those from pyproject.toml.",
            )
            .action(ArgAction::Append)
            .value_parser(clap::value_parser!(String)),
    );

    cmd = cmd.arg(
        Arg::new("add-dependency")
            .short('A')
            .long("add-dependency")
            .value_name("DEP")
            .help("Add an extra conda dependency")
            .action(ArgAction::Append)
            .value_parser(clap::value_parser!(String)),
    );

    cmd = cmd.arg(
        Arg::new("python")
            .long("python")
            .value_name("SPEC")
            .help("Override the python version spec of the package")
            .value_parser(clap::value_parser!(String)),
    );

    cmd = cmd.arg(
        Arg::new("build-number")
            .long("build-number")
            .value_name("N")
            .help("Conda build number, defaults to the wheel's build tag")
            .value_parser(clap::value_parser!(u64)),
    );

    cmd = cmd.arg(
        Arg::new("name")
            .long("name")
            .value_name("NAME")
            .help("Override the conda package name")
            .value_parser(clap::value_parser!(String)),
    );

    cmd = cmd.arg(
        Arg::new("renames-file")
            .long("renames-file")
            .value_name("FILE")
            .help("Standard renames JSON file to use instead of the cached table")
            .value_parser(clap::value_parser!(PathBuf))
            .conflicts_with("no-std-renames"),
    );

    cmd = cmd.arg(
        Arg::new("no-std-renames")
            .long("no-std-renames")
            .help("Do not apply the standard pypi to conda renames")
            .action(ArgAction::SetTrue),
    );

    cmd = cmd.arg(
        Arg::new("rewrite-metadata")
            .long("rewrite-metadata")
            .help("Move base dependencies in METADATA under the 'original' extra")
            .long_help(
                "Rewrites METADATA in place so that every base dependency is only required \
                by the 'original' extra. This keeps pip from installing pypi packages over \
                their conda counterparts.",
            )
            .action(ArgAction::SetTrue),
    );

    cmd = cmd.arg(
        Arg::new("format")
            .long("format")
            .value_name("FORMAT")
            .help("Conda package format: V1, V2 or TREE")
            .value_parser(|s: &str| s.parse::<CondaPackageFormat>().map_err(|e| e.to_string())),
    );

    cmd = cmd.arg(
        Arg::new("out")
            .short('o')
            .long("out")
            .value_name("FILE")
            .help("Write index.json to FILE instead of stdout")
            .value_parser(clap::value_parser!(PathBuf)),
    );

    cmd = cmd.arg(
        Arg::new("init-config")
            .long("init-config")
            .value_name("DIR")
            .help("Add default [tool.whl2conda] settings to a pyproject.toml and exit")
            .long_help(
                "Adds every missing [tool.whl2conda] setting, with comments, to the \
                pyproject.toml in DIR (or to DIR itself if it is a .toml file). \
                Use '-' to print the defaults instead.",
            )
            .value_parser(clap::value_parser!(PathBuf)),
    );

    cmd = cmd.arg(
        Arg::new("verbose")
            .short('v')
            .long("verbose")
            .help("Show debug output")
            .action(ArgAction::SetTrue)
            .conflicts_with("quiet"),
    );

    cmd = cmd.arg(
        Arg::new("quiet")
            .short('q')
            .long("quiet")
            .help("Only show warnings and errors")
            .action(ArgAction::SetTrue),
    );

    let after_help = "EXAMPLES:
# Convert an unpacked wheel
whl2conda build/mypkg-1.0.dist-info

# Rename all acme-<foo> packages to acme.<foo>
whl2conda build/mypkg-1.0.dist-info -R 'acme-(.*)' 'acme.$1'

# Drop a dependency and add a conda-only one
whl2conda build/mypkg-1.0.dist-info -R 'typing-extensions' '' -A 'libzmq >=4'

# Use settings from a project's pyproject.toml
whl2conda build/mypkg-1.0.dist-info --project-root .

# Add default settings to pyproject.toml
whl2conda --init-config .";

    cmd.after_help(after_help)
}

/// Parses the process arguments
pub fn parse() -> Args {
    Args::from_matches(&command().get_matches())
}

/// Outcome of converting one unpacked wheel
#[derive(Debug, Clone)]
pub struct ConvertedWheel {
    pub index: IndexJson,
    pub conversion: Conversion,
    /// Name of the conda package file that would be written
    pub package_file: String,
    /// Where index.json goes, `None` for stdout
    pub index_path: Option<PathBuf>,
}

/// Runs the command described by `args`
pub fn execute(args: &Args) -> Result<()> {
    if let Some(path) = &args.init_config {
        if path.as_os_str() == "-" {
            print!("{}", pyproject_with_defaults("")?);
        } else {
            add_pyproject_defaults(path)?;
        }
        return Ok(());
    }

    let converted = convert_wheel(args)?;
    let json = converted.index.to_json()?;

    match &converted.index_path {
        Some(out) => {
            if let Some(parent) = out.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(out, format!("{}\n", json)).map_err(|e| Error::FileOperation {
                path: out.clone(),
                message: format!("Failed to write index.json: {}", e),
            })?;
            info!("Wrote {}", out.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}

/// Reads the unpacked wheel named by `args` and converts its dependencies.
///
/// Rename rules are compiled before anything is read so a bad rule fails
/// without side effects.
pub fn convert_wheel(args: &Args) -> Result<ConvertedWheel> {
    let pyproj = match &args.project_root {
        Some(root) => read_pyproject(root)?,
        None => PyProjInfo::default(),
    };

    let rename_pairs: Vec<(String, String)> = args
        .dependency_rename
        .iter()
        .chain(pyproj.dependency_rename.iter())
        .cloned()
        .collect();
    let renamer = DependencyRenamer::from_pairs(&rename_pairs, std_renames(args)?)?;

    let dist_info = args
        .dist_info
        .as_deref()
        .or(pyproj.wheel_dir.as_deref())
        .ok_or_else(|| Error::General("No dist-info directory given".to_string()))?;
    let dist = read_dist_info(dist_info)?;
    let wheel = WheelInfo::parse(&dist.wheel);
    wheel.validate()?;
    let metadata = WheelMetadata::parse(&dist.metadata)?;
    info!("Converting {} {}", metadata.name, metadata.version);

    let mut diagnostics = Diagnostics::new();
    let entries = metadata.dependencies(&mut diagnostics);

    let extra_dependencies: Vec<String> = pyproj
        .extra_dependencies
        .iter()
        .chain(args.add_dependency.iter())
        .cloned()
        .collect();
    let converter = DependencyConverter::new(renamer)
        .with_extra_dependencies(extra_dependencies)
        .with_python_version(args.python.clone().unwrap_or_default());
    let mut conversion = converter.convert(&entries, &metadata.requires_python);
    diagnostics.extend(std::mem::take(&mut conversion.diagnostics));
    conversion.diagnostics = diagnostics;

    let warnings = conversion.diagnostics.warnings().count();
    if warnings > 0 {
        warn!("{} warnings while converting dependencies", warnings);
    }

    if args.rewrite_metadata {
        let path = dist.metadata_path();
        fs::write(&path, rewrite_requires_dist(&dist.metadata, &entries)).map_err(|e| {
            Error::FileOperation {
                path: path.clone(),
                message: format!("Failed to rewrite METADATA: {}", e),
            }
        })?;
        info!("Rewrote {}", path.display());
    }

    let name = args
        .name
        .clone()
        .or_else(|| Some(pyproj.conda_name.clone()).filter(|n| !n.is_empty()))
        .unwrap_or_else(|| metadata.name.clone());

    let index = IndexJson::new(
        &name,
        &metadata.version,
        metadata.license.as_deref(),
        &conversion.dependencies,
        &wheel.build,
        args.build_number,
    );

    let format = args.format.or(pyproj.conda_format).unwrap_or_default();
    let package_file = format.package_file_name(&index.name, &index.version, &index.build);
    info!("Conda package: {}", package_file);

    // out-dir holds the unpacked package tree, its index lives under info/
    let index_path = args.out.clone().or_else(|| {
        pyproj.out_dir.as_ref().map(|dir| {
            dir.join(CondaPackageFormat::Tree.package_file_name(
                &index.name,
                &index.version,
                &index.build,
            ))
            .join("info")
            .join("index.json")
        })
    });

    Ok(ConvertedWheel {
        index,
        conversion,
        package_file,
        index_path,
    })
}

fn std_renames(args: &Args) -> Result<StdRenames> {
    if args.no_std_renames {
        return Ok(StdRenames::default());
    }
    match &args.renames_file {
        Some(path) => StdRenames::load(path),
        None => load_std_renames(),
    }
}
